use anyhow::{anyhow, Context, Result};
use blueprint_fitness::models::{RepRange, SetConfiguration, WeightUnit};
use regex::Regex;

/// Parses the shorthand used on the command line for planned sets:
///
/// - `5x5`: five sets of five, no load
/// - `3x10@60`: three sets of ten at 60 in the default unit
/// - `3x8-12@80kg`: rep range with an explicit unit
/// - `4x30s`: four timed sets of thirty seconds
pub struct SetParser {
    standard: Regex,
    timed: Regex,
}

impl SetParser {
    pub fn new() -> Result<Self> {
        let standard = Regex::new(
            r"(?i)^(\d+)\s*x\s*(\d+)(?:\s*-\s*(\d+))?(?:\s*@\s*(\d+(?:\.\d+)?)\s*(kg|kgs|lb|lbs)?)?$",
        )
        .context("Invalid set pattern")?;
        let timed = Regex::new(r"(?i)^(\d+)\s*x\s*(\d+)\s*(s|sec|min)$").context("Invalid timed set pattern")?;
        Ok(Self { standard, timed })
    }

    /// Parse `input`; loads without a unit are read in `default_unit`
    /// and always returned in kilograms
    pub fn parse(&self, input: &str, default_unit: WeightUnit) -> Result<SetConfiguration> {
        let input = input.trim();

        if let Some(captures) = self.timed.captures(input) {
            let sets = number(&captures[1])?;
            let amount = number(&captures[2])?;
            let duration_seconds = if captures[3].eq_ignore_ascii_case("min") {
                amount
                    .checked_mul(60)
                    .ok_or_else(|| anyhow!("{} minutes is too long for a set", amount))?
            } else {
                amount
            };
            return Ok(SetConfiguration::Timed {
                sets,
                duration_seconds,
            });
        }

        let captures = self
            .standard
            .captures(input)
            .ok_or_else(|| anyhow!("Could not read '{}'; expected something like 3x10@60", input))?;

        let sets = number(&captures[1])?;
        let min = number(&captures[2])?;
        let max = match captures.get(3) {
            Some(m) => number(m.as_str())?,
            None => min,
        };
        if max < min {
            return Err(anyhow!("Rep range {}-{} is backwards", min, max));
        }

        let load = match captures.get(4) {
            Some(m) => {
                let value: f64 = m.as_str().parse().context("Invalid load")?;
                let unit = match captures.get(5) {
                    Some(u) => u.as_str().parse()?,
                    None => default_unit,
                };
                Some(unit.to_kg(value))
            }
            None => None,
        };

        Ok(SetConfiguration::Standard {
            sets,
            reps: RepRange { min, max },
            load,
        })
    }
}

fn number(text: &str) -> Result<u32> {
    text.parse()
        .with_context(|| format!("'{}' is not a valid count", text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<SetConfiguration> {
        SetParser::new().unwrap().parse(input, WeightUnit::Kg)
    }

    #[test]
    fn test_sets_and_reps_only() {
        assert_eq!(parse("5x5").unwrap(), SetConfiguration::standard(5, 5, None));
    }

    #[test]
    fn test_load_in_default_unit() {
        assert_eq!(
            parse("3x10@60").unwrap(),
            SetConfiguration::standard(3, 10, Some(60.0))
        );
    }

    #[test]
    fn test_rep_range_with_unit() {
        let config = parse("3x8-12@80kg").unwrap();
        assert_eq!(
            config,
            SetConfiguration::Standard {
                sets: 3,
                reps: RepRange { min: 8, max: 12 },
                load: Some(80.0),
            }
        );
    }

    #[test]
    fn test_pounds_converted_to_kg() {
        let config = SetParser::new()
            .unwrap()
            .parse("3 x 5 @ 225", WeightUnit::Lbs)
            .unwrap();
        match config {
            SetConfiguration::Standard { load: Some(kg), .. } => {
                assert!((kg - 102.06).abs() < 0.01)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_timed_sets() {
        assert_eq!(
            parse("4x30s").unwrap(),
            SetConfiguration::Timed {
                sets: 4,
                duration_seconds: 30
            }
        );
        assert_eq!(
            parse("2x3min").unwrap(),
            SetConfiguration::Timed {
                sets: 2,
                duration_seconds: 180
            }
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse("ten sets").is_err());
        assert!(parse("3x12-8").is_err());
        assert!(parse("3x").is_err());
    }

    #[test]
    fn test_rejects_minutes_that_overflow() {
        let err = parse("2x100000000min").unwrap_err();
        assert!(err.to_string().contains("too long"));
    }
}
