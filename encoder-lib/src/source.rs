use crate::*;

/// An ordered, finite sequence of target screens. Implementations must
/// hand over internally consistent screens (`Screen::new` enforces the
/// viewport-coverage contract).
pub trait FrameSource {
    fn frames(&self) -> &[ScreenRef];
}

impl FrameSource for Vec<ScreenRef> {
    fn frames(&self) -> &[ScreenRef] {
        self
    }
}

impl FrameSource for [ScreenRef] {
    fn frames(&self) -> &[ScreenRef] {
        self
    }
}

impl<T: FrameSource + ?Sized> FrameSource for &T {
    fn frames(&self) -> &[ScreenRef] {
        (*self).frames()
    }
}
