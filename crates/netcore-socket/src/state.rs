use bitflags::bitflags;

bitflags! {
    /// Socket state bits. Moves only ever go monotonically toward `CLOSE`:
    /// `PRE_CLOSE` is a one-way door, and once `CLOSE` is set the socket is
    /// torn down on the next `drive` call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SocketState: u16 {
        const LISTENING  = 0b0000_0001;
        const CONNECTING = 0b0000_0010;
        const READ_READY  = 0b0000_0100;
        const WRITE_READY = 0b0000_1000;
        const PRE_CLOSE  = 0b0001_0000;
        const CLOSE      = 0b0010_0000;
        const ERROR      = 0b0100_0000;
    }
}

impl Default for SocketState {
    fn default() -> Self {
        Self::empty()
    }
}
