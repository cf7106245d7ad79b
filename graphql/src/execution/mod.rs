mod execution;
mod resolver;
mod scope;

pub use self::execution::execute_operation;
pub use self::resolver::{Arguments, Resolve};
pub use self::scope::OperationScope;
