use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{SchedulerError, SchedulerResult};

/// 任务数据值
///
/// 带类型标签的数据值，按错误的类型读取会显式失败而不是隐式转换。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobDataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl JobDataValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            JobDataValue::String(_) => "string",
            JobDataValue::Integer(_) => "integer",
            JobDataValue::Float(_) => "float",
            JobDataValue::Boolean(_) => "boolean",
        }
    }
}

impl From<&str> for JobDataValue {
    fn from(value: &str) -> Self {
        JobDataValue::String(value.to_string())
    }
}

impl From<String> for JobDataValue {
    fn from(value: String) -> Self {
        JobDataValue::String(value)
    }
}

impl From<i64> for JobDataValue {
    fn from(value: i64) -> Self {
        JobDataValue::Integer(value)
    }
}

impl From<i32> for JobDataValue {
    fn from(value: i32) -> Self {
        JobDataValue::Integer(value as i64)
    }
}

impl From<f64> for JobDataValue {
    fn from(value: f64) -> Self {
        JobDataValue::Float(value)
    }
}

impl From<f32> for JobDataValue {
    fn from(value: f32) -> Self {
        JobDataValue::Float(value as f64)
    }
}

impl From<bool> for JobDataValue {
    fn from(value: bool) -> Self {
        JobDataValue::Boolean(value)
    }
}

/// 任务数据映射
///
/// 随任务执行传入的键值数据。注册之后调度器不再对其修改，
/// 每次执行前由调度器把任务级数据与触发器级数据合并成新的映射。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDataMap {
    entries: HashMap<String, JobDataValue>,
}

impl JobDataMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一个键值，同名键会被覆盖
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<JobDataValue>
    where
        K: Into<String>,
        V: Into<JobDataValue>,
    {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&JobDataValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn get_string(&self, key: &str) -> SchedulerResult<&str> {
        match self.get_required(key)? {
            JobDataValue::String(v) => Ok(v),
            other => Err(Self::type_mismatch(key, "string", other)),
        }
    }

    pub fn get_integer(&self, key: &str) -> SchedulerResult<i64> {
        match self.get_required(key)? {
            JobDataValue::Integer(v) => Ok(*v),
            other => Err(Self::type_mismatch(key, "integer", other)),
        }
    }

    pub fn get_float(&self, key: &str) -> SchedulerResult<f64> {
        match self.get_required(key)? {
            JobDataValue::Float(v) => Ok(*v),
            other => Err(Self::type_mismatch(key, "float", other)),
        }
    }

    pub fn get_boolean(&self, key: &str) -> SchedulerResult<bool> {
        match self.get_required(key)? {
            JobDataValue::Boolean(v) => Ok(*v),
            other => Err(Self::type_mismatch(key, "boolean", other)),
        }
    }

    /// 以self为基础、overlay为覆盖，合并出一个新映射，双方均不被修改
    pub fn merged(&self, overlay: &JobDataMap) -> JobDataMap {
        let mut entries = self.entries.clone();
        for (key, value) in &overlay.entries {
            entries.insert(key.clone(), value.clone());
        }
        JobDataMap { entries }
    }

    fn get_required(&self, key: &str) -> SchedulerResult<&JobDataValue> {
        self.entries
            .get(key)
            .ok_or_else(|| SchedulerError::DataKeyNotFound {
                key: key.to_string(),
            })
    }

    fn type_mismatch(key: &str, expected: &'static str, actual: &JobDataValue) -> SchedulerError {
        SchedulerError::DataTypeMismatch {
            key: key.to_string(),
            expected,
            actual: actual.type_name(),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for JobDataMap
where
    K: Into<String>,
    V: Into<JobDataValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let entries = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        JobDataMap { entries }
    }
}
