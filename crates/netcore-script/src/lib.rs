mod dispatch;
mod value;

pub use dispatch::{CallOutcome, Coroutine, CoroutineHandle, Interpreter, NullCoroutine, NullInterpreter};
pub use value::Value;
