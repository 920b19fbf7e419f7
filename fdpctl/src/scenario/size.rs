// SPDX-License-Identifier: MIT

use serde::{Deserialize, Deserializer};

/// Byte count written in a scenario as `"4K"`, `"1M"`, `"2G"` or a bare
/// integer.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Size(pub u64);

impl Size {
    #[inline]
    pub fn bytes(self) -> u64 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Size {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SizeVisitor;

        impl<'de> serde::de::Visitor<'de> for SizeVisitor {
            type Value = Size;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a size like '4K', '1M', '2G' or a byte count")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(value)
                    .map(Size)
                    .map_err(|_| E::custom(format!("Negative size {value}")))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Size(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                parse_size(value).map(Size).map_err(|_| {
                    E::custom(format!(
                        "Invalid size format '{value}'. Use K, M or G suffix."
                    ))
                })
            }
        }

        deserializer.deserialize_any(SizeVisitor)
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", crate::utils::pretty_bytes(self.0))
    }
}

fn parse_size(size: &str) -> anyhow::Result<u64> {
    let lower = size.trim().to_lowercase();
    let (num, mult) = if let Some(num) = lower.strip_suffix("k") {
        (num, 1u64 << 10)
    } else if let Some(num) = lower.strip_suffix("m") {
        (num, 1 << 20)
    } else if let Some(num) = lower.strip_suffix("g") {
        (num, 1 << 30)
    } else {
        (lower.as_str(), 1)
    };
    let n = num.trim().parse::<u64>()?;
    n.checked_mul(mult)
        .ok_or_else(|| anyhow::anyhow!("Size '{}' overflows", size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        s: Size,
    }

    fn parse(v: &str) -> Result<Size, toml::de::Error> {
        toml::from_str::<Holder>(&format!("s = {v}")).map(|h| h.s)
    }

    #[test]
    fn suffixes() {
        assert_eq!(parse("\"4K\"").unwrap(), Size(4096));
        assert_eq!(parse("\"1m\"").unwrap(), Size(1 << 20));
        assert_eq!(parse("\" 2G \"").unwrap(), Size(2 << 30));
        assert_eq!(parse("\"40960\"").unwrap(), Size(40960));
        assert_eq!(parse("512").unwrap(), Size(512));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("\"4X\"").is_err());
        assert!(parse("\"K\"").is_err());
        assert!(parse("-1").is_err());
    }
}
