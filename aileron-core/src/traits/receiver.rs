//! Receiver hooks

/// Receiver signal sampling control
///
/// Sampling is suspended while flash is written, since the bus stalls
/// long enough for the receiver to report a spurious signal loss.
pub trait RxSignal {
    fn suspend(&mut self);
    fn resume(&mut self);
}

impl<T: RxSignal + ?Sized> RxSignal for &mut T {
    fn suspend(&mut self) {
        (**self).suspend()
    }

    fn resume(&mut self) {
        (**self).resume()
    }
}
