/// Expand/collapse state of one section.
///
/// `toggle` is the only transition. The chevron, the highlight and whether
/// the body is drawn are all read from this one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disclosure {
    Collapsed,
    Expanded,
}

impl Disclosure {
    pub fn initial(initially_open: bool) -> Self {
        if initially_open {
            Disclosure::Expanded
        } else {
            Disclosure::Collapsed
        }
    }

    pub fn toggle(&mut self) {
        *self = match self {
            Disclosure::Collapsed => Disclosure::Expanded,
            Disclosure::Expanded => Disclosure::Collapsed,
        };
    }

    pub fn is_expanded(self) -> bool {
        matches!(self, Disclosure::Expanded)
    }

    pub fn chevron(self) -> &'static str {
        match self {
            Disclosure::Collapsed => "▶ ",
            Disclosure::Expanded => "▼ ",
        }
    }
}
