use serde::{Deserialize, Serialize};

/// CloudFormation intrinsic function, resolved by CloudFormation at deploy time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Intrinsic {
    #[serde(rename = "Ref")]
    Ref(String),
    #[serde(rename = "Fn::GetAtt")]
    GetAtt(String, String),
    #[serde(rename = "Fn::Join")]
    Join(String, Vec<CfnString>),
    #[serde(rename = "Fn::Sub")]
    Sub(String),
    #[serde(rename = "Fn::ImportValue")]
    ImportValue(String),
}

impl Intrinsic {
    pub fn reference(logical_id: impl Into<String>) -> Self {
        Intrinsic::Ref(logical_id.into())
    }

    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Intrinsic::GetAtt(logical_id.into(), attribute.into())
    }

    pub fn sub(template: impl Into<String>) -> Self {
        Intrinsic::Sub(template.into())
    }

    pub fn import_value(export_name: impl Into<String>) -> Self {
        Intrinsic::ImportValue(export_name.into())
    }
}

/// Pseudo parameters every template can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pseudo {
    AccountId,
    Region,
    Partition,
    UrlSuffix,
    StackName,
}

impl Pseudo {
    pub fn name(self) -> &'static str {
        match self {
            Pseudo::AccountId => "AWS::AccountId",
            Pseudo::Region => "AWS::Region",
            Pseudo::Partition => "AWS::Partition",
            Pseudo::UrlSuffix => "AWS::URLSuffix",
            Pseudo::StackName => "AWS::StackName",
        }
    }

    pub fn token(self) -> CfnString {
        Resolvable::Token(Intrinsic::Ref(self.name().to_string()))
    }
}

/// A literal value or a token that is only known at deploy time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Resolvable<T> {
    Token(Intrinsic),
    Value(T),
}

/// String property that may carry a token.
pub type CfnString = Resolvable<String>;

impl<T> Resolvable<T> {
    /// Returns the literal value, or `None` for unresolved tokens.
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Resolvable::Value(value) => Some(value),
            Resolvable::Token(_) => None,
        }
    }

    pub fn is_token(&self) -> bool {
        matches!(self, Resolvable::Token(_))
    }
}

impl CfnString {
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().map(String::as_str)
    }
}

impl<T> From<Intrinsic> for Resolvable<T> {
    fn from(token: Intrinsic) -> Self {
        Resolvable::Token(token)
    }
}

impl From<String> for CfnString {
    fn from(value: String) -> Self {
        Resolvable::Value(value)
    }
}

impl From<&str> for CfnString {
    fn from(value: &str) -> Self {
        Resolvable::Value(value.to_string())
    }
}

impl From<&String> for CfnString {
    fn from(value: &String) -> Self {
        Resolvable::Value(value.clone())
    }
}

impl PartialEq<&str> for CfnString {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

/// Joins parts with a separator, folding adjacent literals so a fully literal
/// input stays a plain string.
pub fn join<I>(separator: &str, parts: I) -> CfnString
where
    I: IntoIterator<Item = CfnString>,
{
    let mut folded: Vec<CfnString> = Vec::new();
    let mut first = true;
    for part in parts {
        if !first && !separator.is_empty() {
            push_folded(&mut folded, Resolvable::Value(separator.to_string()));
        }
        first = false;
        match part {
            Resolvable::Token(Intrinsic::Join(inner_sep, inner)) if inner_sep.is_empty() => {
                for piece in inner {
                    push_folded(&mut folded, piece);
                }
            }
            other => push_folded(&mut folded, other),
        }
    }

    match folded.len() {
        0 => Resolvable::Value(String::new()),
        1 => folded.remove(0),
        _ => Resolvable::Token(Intrinsic::Join(String::new(), folded)),
    }
}

fn push_folded(parts: &mut Vec<CfnString>, part: CfnString) {
    if let Resolvable::Value(text) = &part {
        if text.is_empty() {
            return;
        }
        if let Some(Resolvable::Value(last)) = parts.last_mut() {
            last.push_str(text);
            return;
        }
    }
    parts.push(part);
}

/// Concatenates parts without a separator.
pub fn concat<I>(parts: I) -> CfnString
where
    I: IntoIterator<Item = CfnString>,
{
    join("", parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn intrinsics_render_as_cloudformation_functions() {
        let value = serde_json::to_value(Intrinsic::get_att("Trail", "Arn")).expect("json");
        assert_eq!(value, json!({"Fn::GetAtt": ["Trail", "Arn"]}));

        let value = serde_json::to_value(Intrinsic::reference("Bucket")).expect("json");
        assert_eq!(value, json!({"Ref": "Bucket"}));
    }

    #[test]
    fn literal_join_stays_literal() {
        let joined = join(":", vec!["arn".into(), "aws".into(), "s3".into()]);
        assert_eq!(joined, "arn:aws:s3");
    }

    #[test]
    fn join_with_token_renders_fn_join() {
        let joined = concat(vec![
            "arn:".into(),
            Pseudo::Partition.token(),
            ":s3:::".into(),
        ]);
        let value = serde_json::to_value(&joined).expect("json");
        assert_eq!(
            value,
            json!({"Fn::Join": ["", ["arn:", {"Ref": "AWS::Partition"}, ":s3:::"]]})
        );
    }

    #[test]
    fn string_deserializes_as_literal_and_map_as_token() {
        let literal: CfnString = serde_json::from_value(json!("name")).expect("literal");
        assert_eq!(literal, "name");
        let token: CfnString = serde_json::from_value(json!({"Ref": "Topic"})).expect("token");
        assert!(token.is_token());
    }
}
