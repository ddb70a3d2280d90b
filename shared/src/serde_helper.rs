//! 边界处的反序列化辅助
//!
//! 后端字段形态并不统一（数字/字符串 id、`null` 代替空串、
//! 新旧字段名并存），这里一次性归一，视图层不再判断字段是否存在。

use serde::{Deserialize, Deserializer};

/// 实体主键
pub type Id = u64;

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Num(u64),
    Str(String),
}

impl IdRepr {
    fn into_id<E: serde::de::Error>(self) -> Result<Id, E> {
        match self {
            IdRepr::Num(n) => Ok(n),
            IdRepr::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid id: {:?}", s))),
        }
    }
}

/// 接受 `12` 或 `"12"`
pub fn id<'de, D>(deserializer: D) -> Result<Id, D::Error>
where
    D: Deserializer<'de>,
{
    IdRepr::deserialize(deserializer)?.into_id()
}

/// 接受 `12`、`"12"`、`null`；空字符串视为 None
pub fn opt_id<'de, D>(deserializer: D) -> Result<Option<Id>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<IdRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IdRepr::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(repr) => repr.into_id().map(Some),
    }
}

/// `null` 按类型默认值处理（Django 对可空文本字段可能返回 null）
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// 空字符串视为 None
pub fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "id")]
        id: Id,
        #[serde(default, deserialize_with = "opt_id")]
        owner: Option<Id>,
        #[serde(default, deserialize_with = "null_as_default")]
        text: String,
        #[serde(default, deserialize_with = "non_empty")]
        hora: Option<String>,
    }

    #[test]
    fn test_numeric_and_string_ids() {
        let a: Probe = serde_json::from_str(r#"{"id": 7, "owner": "3"}"#).unwrap();
        assert_eq!(a.id, 7);
        assert_eq!(a.owner, Some(3));

        let b: Probe = serde_json::from_str(r#"{"id": "42", "owner": null}"#).unwrap();
        assert_eq!(b.id, 42);
        assert_eq!(b.owner, None);
    }

    #[test]
    fn test_bad_id_is_rejected() {
        assert!(serde_json::from_str::<Probe>(r#"{"id": "abc"}"#).is_err());
    }

    #[test]
    fn test_null_text_and_blank_time() {
        let p: Probe = serde_json::from_str(r#"{"id": 1, "text": null, "hora": ""}"#).unwrap();
        assert_eq!(p.text, "");
        assert_eq!(p.hora, None);
    }
}
