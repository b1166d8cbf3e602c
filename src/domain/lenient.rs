// Serde helpers for numbers that users typed into free-text fields.
// The store keeps them as either JSON numbers or numeric strings.
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

pub fn option_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

pub fn f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(option_f64(deserializer)?.unwrap_or(0.0))
}

pub fn seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = option_f64(deserializer)?.unwrap_or(0.0);
    Ok(if value.is_finite() && value > 0.0 { value as u64 } else { 0 })
}

/// Unit pickers left untouched store `""`; that and any unit we do not
/// know decode to the default unit.
pub fn unit_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum KnownOrNot<T> {
        Known(T),
        Unknown(IgnoredAny),
    }

    Ok(match Option::<KnownOrNot<T>>::deserialize(deserializer)? {
        Some(KnownOrNot::Known(unit)) => unit,
        Some(KnownOrNot::Unknown(_)) | None => T::default(),
    })
}
