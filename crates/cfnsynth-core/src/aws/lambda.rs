use crate::token::{CfnString, Intrinsic};

/// Reference to a Lambda function, used by data event selectors.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionRef {
    pub function_arn: CfnString,
}

impl FunctionRef {
    pub fn from_function_arn(arn: impl Into<CfnString>) -> Self {
        Self {
            function_arn: arn.into(),
        }
    }

    pub fn from_function_name(name: &str) -> Self {
        Self::from_function_arn(Intrinsic::sub(format!(
            "arn:${{AWS::Partition}}:lambda:${{AWS::Region}}:${{AWS::AccountId}}:function:{name}"
        )))
    }
}
