//! 按参数类型注入
//!
//! `Injectable` 为所有 `Fn(A1, .., An) -> R`（n <= 8）实现：报告参数类型，
//! 并用容器中按类型解析出的单例调用函数。

use super::instance::TypeKey;
use super::Container;
use crate::error::{BoxError, ResolveError};

/// 可由容器提供参数的函数
///
/// `Args` 是参数类型组成的元组，仅用于区分不同元数的实现。
pub trait Injectable<Args, R> {
    /// 按声明顺序的参数类型
    fn dependencies() -> Vec<TypeKey>;

    /// 解析全部参数后调用函数；任一参数解析失败时函数不会被调用
    fn inject(&self, container: &Container) -> Result<R, ResolveError>;
}

macro_rules! impl_injectable {
    ($($arg:ident),*) => {
        impl<Func, R, $($arg,)*> Injectable<($($arg,)*), R> for Func
        where
            Func: Fn($($arg),*) -> R,
            $($arg: Clone + Send + Sync + 'static,)*
        {
            fn dependencies() -> Vec<TypeKey> {
                vec![$(TypeKey::of::<$arg>()),*]
            }

            #[allow(non_snake_case, unused_variables)]
            fn inject(&self, container: &Container) -> Result<R, ResolveError> {
                $(let $arg = container.resolve::<$arg>()?;)*
                Ok((self)($($arg),*))
            }
        }
    };
}

impl_injectable!();
impl_injectable!(A1);
impl_injectable!(A1, A2);
impl_injectable!(A1, A2, A3);
impl_injectable!(A1, A2, A3, A4);
impl_injectable!(A1, A2, A3, A4, A5);
impl_injectable!(A1, A2, A3, A4, A5, A6);
impl_injectable!(A1, A2, A3, A4, A5, A6, A7);
impl_injectable!(A1, A2, A3, A4, A5, A6, A7, A8);

/// `Container::call` 接受的返回类型：`()` 或任意 `Result<T, E>`
///
/// `Ok` 中的值被丢弃，只传播错误。
pub trait CallOutput {
    fn into_result(self) -> Result<(), BoxError>;
}

impl CallOutput for () {
    fn into_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<T, E> CallOutput for Result<T, E>
where
    E: Into<BoxError>,
{
    fn into_result(self) -> Result<(), BoxError> {
        self.map(|_| ()).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone)]
    struct Clock;
    struct Service;

    fn no_args() -> u8 {
        1
    }

    fn two_args(_clock: Clock, _name: Arc<String>) -> Service {
        Service
    }

    fn dependencies_of<F, Args, R>(_f: &F) -> Vec<TypeKey>
    where
        F: Injectable<Args, R>,
    {
        <F as Injectable<Args, R>>::dependencies()
    }

    #[test]
    fn test_dependencies_follow_declaration_order() {
        assert!(dependencies_of(&no_args).is_empty());

        let deps = dependencies_of(&two_args);
        assert_eq!(deps, vec![TypeKey::of::<Clock>(), TypeKey::of::<Arc<String>>()]);
    }

    #[test]
    fn test_call_output_conversions() {
        assert!(().into_result().is_ok());
        assert!(Ok::<(), String>(()).into_result().is_ok());
        assert!(Ok::<u32, String>(7).into_result().is_ok());

        let err = Err::<(), _>("nope".to_string()).into_result().unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }
}
