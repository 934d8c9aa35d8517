//! 惰性依赖注入容器
//!
//! 注册阶段通过 `put` 登记构建函数（需要 `&mut Container`），之后容器可在
//! 多个线程间共享，`find` / `try_find` / `call` / `range` 均只需 `&Container`。
//! 每个实例在首次被请求时才构建，且整个容器生命周期内只构建一次。

pub mod inject;
pub mod instance;

use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::ContainerSettings;
use crate::error::{BoxError, CallError, RegistrationError, ResolveError};
use crate::lazy::LazyState;

pub use inject::{CallOutput, Injectable};
pub use instance::{Shared, Signature, TypeKey};

use instance::{ErasedBuilder, Instance};

/// 依赖注入容器
///
/// 两个索引（名称、输出类型）指向同一组实例记录，均在 `put` 时一次性写入。
#[derive(Default)]
pub struct Container {
    instances: Vec<Instance>,
    names: HashMap<String, usize>,
    types: HashMap<TypeKey, usize>,
    stats: InnerStats,
}

/// 内部统计（原子计数器）
#[derive(Default)]
struct InnerStats {
    total_resolutions: AtomicUsize,
    builds: AtomicUsize,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个不会失败的构建函数
    ///
    /// 构建函数的每个参数类型都必须由另一个实例提供；输出类型在容器内必须唯一。
    /// 注册本身不会调用构建函数。
    pub fn put<F, Args, O>(&mut self, builder: F, name: &str) -> Result<(), RegistrationError>
    where
        F: Injectable<Args, O> + Send + Sync + 'static,
        Args: 'static,
        O: Clone + Send + Sync + 'static,
    {
        let signature = Signature {
            params: <F as Injectable<Args, O>>::dependencies(),
            output: TypeKey::of::<O>(),
        };
        let owner = name.to_string();
        let erased: ErasedBuilder = Box::new(move |container: &Container| {
            let value = <F as Injectable<Args, O>>::inject(&builder, container)
                .map_err(|err| err.required_by(&owner))?;
            Ok(Arc::new(value) as Shared)
        });
        self.register(name, signature, erased)
    }

    /// 注册一个返回 `Result<O, E>` 的构建函数
    ///
    /// 构建函数返回的错误会作为该实例的构建失败被缓存。
    pub fn put_fallible<F, Args, O, E>(
        &mut self,
        builder: F,
        name: &str,
    ) -> Result<(), RegistrationError>
    where
        F: Injectable<Args, Result<O, E>> + Send + Sync + 'static,
        Args: 'static,
        O: Clone + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        let signature = Signature {
            params: <F as Injectable<Args, Result<O, E>>>::dependencies(),
            output: TypeKey::of::<O>(),
        };
        let owner = name.to_string();
        let erased: ErasedBuilder = Box::new(move |container: &Container| {
            let built = <F as Injectable<Args, Result<O, E>>>::inject(&builder, container)
                .map_err(|err| err.required_by(&owner))?;
            match built {
                Ok(value) => Ok(Arc::new(value) as Shared),
                Err(err) => {
                    let source: BoxError = err.into();
                    Err(ResolveError::Build {
                        name: owner.clone(),
                        source: Arc::from(source),
                    })
                }
            }
        });
        self.register(name, signature, erased)
    }

    fn register(
        &mut self,
        name: &str,
        signature: Signature,
        builder: ErasedBuilder,
    ) -> Result<(), RegistrationError> {
        if name.is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        if self.names.contains_key(name) {
            return Err(RegistrationError::DuplicateName(name.to_string()));
        }
        if let Some(&existing) = self.types.get(&signature.output) {
            return Err(RegistrationError::DuplicateType {
                type_name: signature.output.name(),
                existing: self.instances[existing].name().to_string(),
            });
        }

        tracing::debug!(
            instance = name,
            output = signature.output.name(),
            params = signature.params.len(),
            "Registered instance"
        );

        let index = self.instances.len();
        self.names.insert(name.to_string(), index);
        self.types.insert(signature.output, index);
        self.instances
            .push(Instance::new(name.to_string(), signature, builder));
        Ok(())
    }

    /// 按名称查找并转换为 `T`，失败时返回 `None`
    pub fn find<T>(&self, name: &str) -> Option<T>
    where
        T: Clone + 'static,
    {
        self.try_find(name).ok()
    }

    /// 按名称查找并转换为 `T`
    pub fn try_find<T>(&self, name: &str) -> Result<T, ResolveError>
    where
        T: Clone + 'static,
    {
        let index = self.index_of(name)?;
        let value = self.instances[index].get(self)?;
        self.downcast(index, &value)
    }

    /// 按名称查找，返回类型擦除的单例
    pub fn try_find_any(&self, name: &str) -> Result<Shared, ResolveError> {
        let index = self.index_of(name)?;
        self.instances[index].get(self)
    }

    /// 按输出类型查找唯一提供 `T` 的实例
    pub fn resolve<T>(&self) -> Result<T, ResolveError>
    where
        T: Clone + 'static,
    {
        let key = TypeKey::of::<T>();
        let index = *self
            .types
            .get(&key)
            .ok_or(ResolveError::MissingDependency {
                dependent: None,
                type_name: key.name(),
            })?;
        let value = self.instances[index].get(self)?;
        self.downcast(index, &value)
    }

    /// 调用任意函数，参数按类型从容器注入
    ///
    /// 任一参数无法解析时函数不会被调用。
    pub fn call<F, Args, R>(&self, f: F) -> Result<(), CallError>
    where
        F: Injectable<Args, R>,
        R: CallOutput,
    {
        let output = <F as Injectable<Args, R>>::inject(&f, self)?;
        output.into_result().map_err(CallError::Failed)
    }

    /// 按注册顺序构建并遍历所有实例
    ///
    /// 任一实例构建失败时立即返回该错误；访问者返回 `Break` 时提前结束，
    /// 之后的实例既不访问也不构建。
    pub fn range<V>(&self, mut visitor: V) -> Result<(), ResolveError>
    where
        V: FnMut(&str, &Shared) -> ControlFlow<()>,
    {
        for instance in &self.instances {
            let value = instance.get(self)?;
            if visitor(instance.name(), &value).is_break() {
                break;
            }
        }
        Ok(())
    }

    /// 不构建任何实例，检查缺失依赖和依赖环
    pub fn verify(&self) -> Result<(), ResolveError> {
        for instance in &self.instances {
            for param in &instance.signature().params {
                if !self.types.contains_key(param) {
                    return Err(ResolveError::MissingDependency {
                        dependent: Some(instance.name().to_string()),
                        type_name: param.name(),
                    });
                }
            }
        }
        for instance in &self.instances {
            if let Some(path) = self.cycle_through(&instance.signature().output) {
                return Err(ResolveError::Cycle { path });
            }
        }
        Ok(())
    }

    /// 结束注册阶段，按配置校验或预先构建全部实例
    pub fn seal(self, settings: &ContainerSettings) -> Result<Arc<Self>, ResolveError> {
        if settings.verify_on_start {
            self.verify()?;
        }
        if settings.eager {
            self.range(|_, _| ControlFlow::Continue(()))?;
        }
        tracing::info!(
            instances = self.instances.len(),
            verified = settings.verify_on_start,
            eager = settings.eager,
            "Container sealed"
        );
        Ok(Arc::new(self))
    }

    /// 实例的构建状态，未注册时返回 `None`
    pub fn state(&self, name: &str) -> Option<LazyState> {
        self.names
            .get(name)
            .map(|&index| self.instances[index].state())
    }

    pub fn signature(&self, name: &str) -> Option<&Signature> {
        self.names
            .get(name)
            .map(|&index| self.instances[index].signature())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// 是否有实例提供类型 `T`
    pub fn provides<T: 'static>(&self) -> bool {
        self.types.contains_key(&TypeKey::of::<T>())
    }

    /// 按注册顺序返回所有名称
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.instances.iter().map(Instance::name)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// 获取容器统计信息
    pub fn get_stats(&self) -> ContainerStats {
        let total_resolutions = self.stats.total_resolutions.load(Ordering::Relaxed);
        let cache_misses = self.stats.builds.load(Ordering::Relaxed);
        ContainerStats {
            total_resolutions,
            cache_hits: total_resolutions.saturating_sub(cache_misses),
            cache_misses,
        }
    }

    pub(crate) fn record_resolution(&self) {
        self.stats.total_resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_build(&self) {
        self.stats.builds.fetch_add(1, Ordering::Relaxed);
    }

    fn index_of(&self, name: &str) -> Result<usize, ResolveError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| ResolveError::NotRegistered(name.to_string()))
    }

    fn downcast<T>(&self, index: usize, value: &Shared) -> Result<T, ResolveError>
    where
        T: Clone + 'static,
    {
        let instance = &self.instances[index];
        value
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| ResolveError::TypeMismatch {
                name: instance.name().to_string(),
                expected: std::any::type_name::<T>(),
                actual: instance.signature().output.name(),
            })
    }

    /// 若提供 `output` 的实例能沿依赖边回到自身，返回环上的名称路径
    pub(crate) fn cycle_through(&self, output: &TypeKey) -> Option<Vec<String>> {
        let start = *self.types.get(output)?;
        let mut path = vec![start];
        let mut visited = HashSet::new();
        if self.reaches(start, start, &mut path, &mut visited) {
            Some(
                path.into_iter()
                    .map(|index| self.instances[index].name().to_string())
                    .collect(),
            )
        } else {
            None
        }
    }

    fn reaches(
        &self,
        target: usize,
        current: usize,
        path: &mut Vec<usize>,
        visited: &mut HashSet<usize>,
    ) -> bool {
        for param in &self.instances[current].signature().params {
            let Some(&next) = self.types.get(param) else {
                continue;
            };
            if next == target {
                path.push(next);
                return true;
            }
            if !visited.insert(next) {
                continue;
            }
            path.push(next);
            if self.reaches(target, next, path, visited) {
                return true;
            }
            path.pop();
        }
        false
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("instances", &self.instances)
            .finish()
    }
}

/// 容器统计信息
///
/// 每次进入实例单元都计为一次解析，包括构建过程中对依赖的递归解析；
/// 因此一次顶层 `find` 可能产生多次解析。`cache_misses` 即实际构建次数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerStats {
    pub total_resolutions: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

impl ContainerStats {
    /// 获取总解析次数
    pub fn total(&self) -> usize {
        self.total_resolutions
    }

    /// 获取缓存命中率
    pub fn hit_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total() as f64
        }
    }
}
