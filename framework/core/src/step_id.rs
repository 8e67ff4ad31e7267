use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Formatter;
use std::str::FromStr;

/// Prefix of the per-step directory under a run, `step-01` through `step-99`.
const STEP_DIR_PREFIX: &str = "step-";

/// The ordinal of a step within a scenario, from 1 to 99.
///
/// Step ids are compared numerically. The zero-padded form (`"01"`) only exists at the storage
/// boundary: it is what [std::fmt::Display] and [Serialize] produce. Deserialization accepts the
/// padded string, an unpadded numeric string or an integer, which covers the numeric
/// `failedStep` written by older result files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StepId(u8);

/// Returned when a value cannot be interpreted as a [StepId].
#[derive(derive_more::Error, derive_more::Display, Debug, Clone, PartialEq, Eq)]
#[display("invalid step id `{value}`: expected an integer between 1 and 99")]
pub struct InvalidStepId {
    value: String,
}

impl InvalidStepId {
    fn new(value: impl ToString) -> Self {
        Self {
            value: value.to_string(),
        }
    }
}

impl StepId {
    pub const FIRST: StepId = StepId(1);
    pub const LAST: StepId = StepId(99);

    pub fn new(ordinal: u64) -> Result<Self, InvalidStepId> {
        match u8::try_from(ordinal) {
            Ok(n) if (Self::FIRST.0..=Self::LAST.0).contains(&n) => Ok(StepId(n)),
            _ => Err(InvalidStepId::new(ordinal)),
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// The name of this step's directory under a run, e.g. `step-03`.
    pub fn dir_name(self) -> String {
        format!("{STEP_DIR_PREFIX}{self}")
    }

    /// Parse a step directory name produced by [StepId::dir_name].
    pub fn from_dir_name(name: &str) -> Option<StepId> {
        let digits = name.strip_prefix(STEP_DIR_PREFIX)?;
        if digits.len() != 2 {
            return None;
        }
        digits.parse().ok()
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl FromStr for StepId {
    type Err = InvalidStepId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidStepId::new(s));
        }
        let ordinal = trimmed.parse::<u64>().map_err(|_| InvalidStepId::new(s))?;
        StepId::new(ordinal).map_err(|_| InvalidStepId::new(s))
    }
}

impl TryFrom<u64> for StepId {
    type Error = InvalidStepId;

    fn try_from(ordinal: u64) -> Result<Self, Self::Error> {
        StepId::new(ordinal)
    }
}

impl Serialize for StepId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StepId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(StepIdVisitor)
    }
}

struct StepIdVisitor;

impl de::Visitor<'_> for StepIdVisitor {
    type Value = StepId;

    fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("a step id between 1 and 99, as a number or a zero-padded string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        StepId::new(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        let ordinal = u64::try_from(v).map_err(|_| E::custom(InvalidStepId::new(v)))?;
        self.visit_u64(ordinal)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }
}
