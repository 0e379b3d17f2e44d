use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::JobDataMap;
use crate::traits::Job;

/// 任务标识
///
/// (name, group) 二元组，在注册表中全局唯一。展示形式为 `group.name`。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobKey {
    pub name: String,
    pub group: String,
}

impl JobKey {
    pub fn new<N: Into<String>, G: Into<String>>(name: N, group: G) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
        }
    }

    /// 使用默认分组 `default` 创建
    pub fn with_name<N: Into<String>>(name: N) -> Self {
        Self::new(name, "default")
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

/// 任务定义
///
/// 任务标识、可执行单元和任务级数据。注册进调度器之后不可变更，
/// 调度器只持有只读引用并在每次触发时调用执行单元。
#[derive(Clone)]
pub struct JobDefinition {
    pub key: JobKey,
    pub data: JobDataMap,
    executable: Arc<dyn Job>,
}

impl JobDefinition {
    pub fn new(key: JobKey, executable: Arc<dyn Job>) -> Self {
        Self {
            key,
            data: JobDataMap::new(),
            executable,
        }
    }

    pub fn with_data(key: JobKey, executable: Arc<dyn Job>, data: JobDataMap) -> Self {
        Self {
            key,
            data,
            executable,
        }
    }

    pub fn executable(&self) -> Arc<dyn Job> {
        Arc::clone(&self.executable)
    }
}

impl fmt::Debug for JobDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobDefinition")
            .field("key", &self.key)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}
