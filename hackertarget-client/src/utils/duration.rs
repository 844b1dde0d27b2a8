//! `Duration` 序列化/反序列化工具
//!
//! 结果类型中的时长统一以整数毫秒输出，便于 JSON 报告阅读与比较：
//! - 序列化: `Duration` -> u64 毫秒
//! - 反序列化: u64 毫秒 或 浮点秒字符串（如 `"1.5s"`）-> `Duration`

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Millis(u64),
    Text(String),
}

fn parse_raw<E: serde::de::Error>(raw: RawDuration) -> Result<Duration, E> {
    match raw {
        RawDuration::Millis(ms) => Ok(Duration::from_millis(ms)),
        RawDuration::Text(s) => {
            let secs = s.trim().trim_end_matches('s');
            secs.parse::<f64>()
                .ok()
                .and_then(|v| Duration::try_from_secs_f64(v).ok())
                .ok_or_else(|| E::custom(format!("Invalid duration: {s}")))
        }
    }
}

fn as_millis_u64(d: &Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// 序列化 `Duration` 为毫秒
pub mod millis {
    use super::{Deserialize, Deserializer, Duration, RawDuration, Serializer, as_millis_u64};

    pub fn serialize<S>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(as_millis_u64(d))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        super::parse_raw(RawDuration::deserialize(deserializer)?)
    }
}

/// 序列化 `Option<Duration>` 为 Option<毫秒>
pub mod option_millis {
    use super::{Deserialize, Deserializer, Duration, RawDuration, Serializer, as_millis_u64};

    pub fn serialize<S>(d: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match d {
            Some(d) => serializer.serialize_some(&as_millis_u64(d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<RawDuration>::deserialize(deserializer)?
            .map(super::parse_raw)
            .transpose()
    }
}
