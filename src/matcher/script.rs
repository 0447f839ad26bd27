//! 脚本谓词求值
//! 每次求值使用独立的 Rhai 引擎实例，仅绑定 `file` 一个变量

use rhai::{Dynamic, Engine, Scope};
use tracing::debug;

use crate::error::{RsvResult, RsviaError};

/// 脚本中可见的输入变量名
pub const FILE_BINDING: &str = "file";

/// 单次求值允许的最大操作数
const DEFAULT_MAX_OPERATIONS: u64 = 100_000;

/// 脚本谓词求值能力
pub trait ScriptEvaluator {
    /// 以 `file` 绑定求值表达式，结果按真值规则转换为 bool
    fn evaluate(&self, source: &str, file: &str) -> RsvResult<bool>;
}

/// 基于 Rhai 的沙箱求值器
#[derive(Debug, Clone)]
pub struct RhaiEvaluator {
    max_operations: u64,
}

impl Default for RhaiEvaluator {
    fn default() -> Self {
        Self {
            max_operations: DEFAULT_MAX_OPERATIONS,
        }
    }
}

impl RhaiEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_operations(max_operations: u64) -> Self {
        Self { max_operations }
    }

    fn build_engine(&self) -> Engine {
        let mut engine = Engine::new();
        engine.set_max_operations(self.max_operations);
        engine.set_max_expr_depths(64, 32);
        engine.set_max_string_size(1 << 20);
        engine.set_max_array_size(10_000);
        engine.set_max_map_size(10_000);
        engine
    }

    /// 真值转换：() 为假；数值非零、字符串非空为真；其余对象一律为真
    pub fn is_truthy(value: &Dynamic) -> bool {
        if value.is_unit() {
            return false;
        }
        if let Ok(b) = value.as_bool() {
            return b;
        }
        if let Ok(i) = value.as_int() {
            return i != 0;
        }
        if let Ok(f) = value.as_float() {
            return f != 0.0 && !f.is_nan();
        }
        if let Ok(c) = value.as_char() {
            return c != '\0';
        }
        if value.is_string() {
            return value
                .clone()
                .into_immutable_string()
                .map(|s| !s.is_empty())
                .unwrap_or(false);
        }
        true
    }
}

impl ScriptEvaluator for RhaiEvaluator {
    fn evaluate(&self, source: &str, file: &str) -> RsvResult<bool> {
        let engine = self.build_engine();
        let mut scope = Scope::new();
        scope.push(FILE_BINDING, file.to_string());

        let value = engine
            .eval_with_scope::<Dynamic>(&mut scope, source)
            .map_err(|e| RsviaError::ScriptError(format!("{}（脚本：{}）", e, source)))?;

        let result = Self::is_truthy(&value);
        debug!("脚本求值完成：file={}，结果={}，返回值={}", file, result, value.type_name());
        Ok(result)
    }
}
