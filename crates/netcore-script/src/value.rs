/// A typed argument the core can push onto a coroutine's call stack.
/// `Object` carries an opaque handle plus whether the interpreter should
/// free it once the call returns.
pub enum Value<'a> {
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bytes(&'a [u8]),
    OwnedBytes(Vec<u8>),
    Object { handle: u64, free_after_call: bool },
}
