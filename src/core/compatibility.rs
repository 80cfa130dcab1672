use crate::models::BloodType;
use BloodType::*;

/// Recipient types a donor type can safely give to
pub fn recipients_of(donor: BloodType) -> &'static [BloodType] {
    match donor {
        ONegative => &[ONegative, OPositive, ANegative, APositive, BNegative, BPositive, AbNegative, AbPositive],
        OPositive => &[OPositive, APositive, BPositive, AbPositive],
        ANegative => &[ANegative, APositive, AbNegative, AbPositive],
        APositive => &[APositive, AbPositive],
        BNegative => &[BNegative, BPositive, AbNegative, AbPositive],
        BPositive => &[BPositive, AbPositive],
        AbNegative => &[AbNegative, AbPositive],
        AbPositive => &[AbPositive],
    }
}

/// Check whether blood of `donor` type can be given to a `recipient`
#[inline]
pub fn is_compatible(donor: BloodType, recipient: BloodType) -> bool {
    recipients_of(donor).contains(&recipient)
}

/// Label form of [`is_compatible`]; unrecognised labels are never compatible
pub fn is_compatible_label(donor: &str, recipient: &str) -> bool {
    match (donor.parse::<BloodType>(), recipient.parse::<BloodType>()) {
        (Ok(donor), Ok(recipient)) => is_compatible(donor, recipient),
        _ => false,
    }
}
