/// Debounced button level
pub trait ButtonInput {
    fn is_pressed(&mut self) -> bool;
}

/// Reports a click on each released to pressed transition
pub struct Button<P: ButtonInput> {
    input: P,
    was_pressed: bool,
}

impl<P: ButtonInput> Button<P> {
    pub fn new(input: P) -> Self {
        Self {
            input,
            was_pressed: false,
        }
    }

    pub fn poll(&mut self) -> bool {
        let pressed = self.input.is_pressed();
        let clicked = pressed && !self.was_pressed;
        self.was_pressed = pressed;
        clicked
    }
}

/// A button that is never pressed
pub struct NoButton;

impl ButtonInput for NoButton {
    fn is_pressed(&mut self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Script<'a> {
        levels: &'a [bool],
        pos: usize,
    }

    impl ButtonInput for Script<'_> {
        fn is_pressed(&mut self) -> bool {
            let level = self.levels.get(self.pos).copied().unwrap_or(false);
            self.pos += 1;
            level
        }
    }

    #[test]
    fn test_click_on_press_edge_only() {
        let mut button = Button::new(Script {
            levels: &[false, true, true, false, true],
            pos: 0,
        });

        let clicks: [bool; 5] = core::array::from_fn(|_| button.poll());
        assert_eq!(clicks, [false, true, false, false, true]);
    }

    #[test]
    fn test_no_button() {
        let mut button = Button::new(NoButton);
        assert!(!button.poll());
    }
}
