use std::fmt;
use std::str::FromStr;

use crate::constants::ONE_CKB;

const CKB_DECIMALS: u8 = 8;
const MAX_DECIMALS: u8 = 38;

/// A token amount with a fixed number of decimals, parsed from and displayed
/// as a decimal string ("1000", "0.5", "12.345").
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct HumanAmount {
    pub value: u128,
    pub decimals: u8,
}

impl HumanAmount {
    pub fn new(value: u128, decimals: u8) -> HumanAmount {
        HumanAmount { value, decimals }
    }

    pub fn parse(input: &str, decimals: u8) -> Result<HumanAmount, String> {
        if decimals > MAX_DECIMALS {
            return Err(format!("decimals too large: {}", decimals));
        }
        let input = input.trim();
        let mut parts = input.split('.');
        let int_part = parts.next().unwrap_or_default();
        let frac_part = parts.next();
        if parts.next().is_some() {
            return Err(format!("invalid amount: {}", input));
        }
        if int_part.is_empty() && frac_part.map(str::is_empty).unwrap_or(true) {
            return Err(format!("invalid amount: {}", input));
        }
        if !int_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("invalid integer part: {}", int_part));
        }
        let unit = 10u128.pow(u32::from(decimals));
        let int_value = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse::<u128>()
                .map_err(|err| format!("parse integer part error: {}", err))?
        };
        let mut value = int_value
            .checked_mul(unit)
            .ok_or_else(|| format!("amount overflow: {}", input))?;
        if let Some(frac) = frac_part {
            if !frac.chars().all(|c| c.is_ascii_digit()) {
                return Err(format!("invalid fraction part: {}", frac));
            }
            if frac.len() > usize::from(decimals) {
                return Err(format!(
                    "too many decimal places: {}, max: {}",
                    frac.len(),
                    decimals
                ));
            }
            if !frac.is_empty() {
                let frac_value = frac
                    .parse::<u128>()
                    .map_err(|err| format!("parse fraction part error: {}", err))?;
                let scale = 10u128.pow(u32::from(decimals) - frac.len() as u32);
                value = value
                    .checked_add(frac_value * scale)
                    .ok_or_else(|| format!("amount overflow: {}", input))?;
            }
        }
        Ok(HumanAmount { value, decimals })
    }
}

impl fmt::Display for HumanAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 10^decimals beyond u128 is larger than any value: all fraction
        let (int_part, frac_part) = match 10u128.checked_pow(u32::from(self.decimals)) {
            Some(unit) => (self.value / unit, self.value % unit),
            None => (0, self.value),
        };
        if frac_part == 0 {
            write!(f, "{}", int_part)
        } else {
            let frac = format!("{:0width$}", frac_part, width = usize::from(self.decimals));
            write!(f, "{}.{}", int_part, frac.trim_end_matches('0'))
        }
    }
}

/// CKB capacity in shannons, written as CKB ("61", "100.5")
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct HumanCapacity(pub u64);

impl From<u64> for HumanCapacity {
    fn from(v: u64) -> HumanCapacity {
        HumanCapacity(v)
    }
}

impl From<HumanCapacity> for u64 {
    fn from(value: HumanCapacity) -> u64 {
        value.0
    }
}

impl FromStr for HumanCapacity {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let amount = HumanAmount::parse(input, CKB_DECIMALS)?;
        u64::try_from(amount.value)
            .map(HumanCapacity)
            .map_err(|_| format!("capacity overflow: {}", input))
    }
}

impl fmt::Display for HumanCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&HumanAmount::new(u128::from(self.0), CKB_DECIMALS), f)
    }
}

impl HumanCapacity {
    pub fn from_ckb(ckb: u64) -> Option<HumanCapacity> {
        ckb.checked_mul(ONE_CKB).map(HumanCapacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_human_amount() {
        assert_eq!(HumanAmount::parse("1000", 8).unwrap().value, 1000_00000000);
        assert_eq!(HumanAmount::parse("0.5", 8).unwrap().value, 50000000);
        assert_eq!(HumanAmount::parse(".5", 2).unwrap().value, 50);
        assert_eq!(HumanAmount::parse("7.", 0).unwrap().value, 7);
        assert_eq!(HumanAmount::parse("12.000001", 6).unwrap().value, 12000001);
    }

    #[test]
    fn test_parse_human_amount_errors() {
        assert!(HumanAmount::parse("", 8).is_err());
        assert!(HumanAmount::parse(".", 8).is_err());
        assert!(HumanAmount::parse("1.2.3", 8).is_err());
        assert!(HumanAmount::parse("-1", 8).is_err());
        assert!(HumanAmount::parse("0.123", 2).is_err());
        assert!(HumanAmount::parse("1e5", 8).is_err());
        assert!(HumanAmount::parse("1", 39).is_err());
    }

    #[test]
    fn test_display_human_amount() {
        assert_eq!(HumanAmount::new(1500_00000000, 8).to_string(), "1500");
        assert_eq!(HumanAmount::new(12345, 3).to_string(), "12.345");
        assert_eq!(HumanAmount::new(1, 8).to_string(), "0.00000001");
        assert_eq!(HumanAmount::new(10, 2).to_string(), "0.1");
        assert_eq!(
            HumanAmount::new(5, 40).to_string(),
            format!("0.{}5", "0".repeat(39))
        );
        assert_eq!(HumanAmount::new(0, 200).to_string(), "0");
    }

    #[test]
    fn test_human_capacity() {
        let capacity = HumanCapacity::from_str("61").unwrap();
        assert_eq!(capacity.0, 61 * ONE_CKB);
        assert_eq!(HumanCapacity::from_str("0.00000001").unwrap().0, 1);
        assert_eq!(HumanCapacity(6_100_000_001).to_string(), "61.00000001");
        assert!(HumanCapacity::from_str("184467440737.09551616").is_err());
        assert_eq!(HumanCapacity::from_ckb(65), Some(HumanCapacity(65 * ONE_CKB)));
    }
}
