use crate::token::CfnString;

/// Reference to a KMS key used to encrypt trail logs or archives.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyRef {
    pub key_arn: CfnString,
}

impl KeyRef {
    pub fn from_key_arn(arn: impl Into<CfnString>) -> Self {
        Self {
            key_arn: arn.into(),
        }
    }
}
