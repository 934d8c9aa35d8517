//! 实例记录
//!
//! 每个注册的构建函数对应一个 `Instance`：名称、签名、类型擦除的构建函数，
//! 以及缓存构建结果的 `Lazy` 单元。

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use super::Container;
use crate::error::ResolveError;
use crate::lazy::{Lazy, LazyState};
use crate::logging::OperationTimer;

/// 类型擦除后的单例值
pub type Shared = std::sync::Arc<dyn Any + Send + Sync>;

/// 类型擦除的构建函数：从容器解析参数并调用构建器
pub(crate) type ErasedBuilder =
    Box<dyn Fn(&Container) -> Result<Shared, ResolveError> + Send + Sync>;

/// 类型标识，相等性只比较 `TypeId`
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// 用于错误信息的类型名
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 构建函数签名：按声明顺序的参数类型和唯一的输出类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<TypeKey>,
    pub output: TypeKey,
}

pub(crate) struct Instance {
    name: String,
    signature: Signature,
    builder: ErasedBuilder,
    value: Lazy<Shared, ResolveError>,
}

impl Instance {
    pub(crate) fn new(name: String, signature: Signature, builder: ErasedBuilder) -> Self {
        Self {
            name,
            signature,
            builder,
            value: Lazy::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn signature(&self) -> &Signature {
        &self.signature
    }

    pub(crate) fn state(&self) -> LazyState {
        self.value.state()
    }

    /// 返回单例，首次调用时构建
    pub(crate) fn get(&self, container: &Container) -> Result<Shared, ResolveError> {
        container.record_resolution();
        self.value.get(|| self.build(container))
    }

    fn build(&self, container: &Container) -> Result<Shared, ResolveError> {
        container.record_build();

        // 环路上的实例在解析任何依赖前失败，避免递归进入正在构建的单元
        if let Some(path) = container.cycle_through(&self.signature.output) {
            return Err(ResolveError::Cycle { path });
        }

        tracing::debug!(
            instance = %self.name,
            output = self.signature.output.name(),
            "Building instance"
        );
        let timer = OperationTimer::new("build_instance").with_metadata("instance", &self.name);
        let result = (self.builder)(container);
        timer.finish(result.is_ok());
        result
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("state", &self.value.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    struct Repo;

    #[test]
    fn test_type_key_equality_ignores_name() {
        let a = TypeKey::of::<Arc<Repo>>();
        let b = TypeKey::of::<Arc<Repo>>();
        let c = TypeKey::of::<Repo>();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.name().ends_with("Repo>"));

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_instance_starts_unbuilt() {
        let instance = Instance::new(
            "repo".into(),
            Signature {
                params: vec![],
                output: TypeKey::of::<Arc<Repo>>(),
            },
            Box::new(|_: &Container| Ok(Arc::new(Arc::new(Repo)) as Shared)),
        );

        assert_eq!(instance.name(), "repo");
        assert!(instance.signature().params.is_empty());
        assert_eq!(instance.state(), LazyState::Unbuilt);
    }
}
