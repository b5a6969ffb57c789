//! CSI/DCS parameter list
//!
//! Up to [`MAX_PARAMS`] decimal values separated by `;`, each optionally
//! followed by up to [`MAX_SUB_PARAMS`] colon separated sub-parameters
//! (`38:2::255:0:0`). Values saturate at 65535. Anything past either
//! ceiling is dropped.

/// Maximum number of parameters
pub const MAX_PARAMS: usize = 16;

/// Maximum number of sub-parameters per parameter
pub const MAX_SUB_PARAMS: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SubParams {
    values: [u16; MAX_SUB_PARAMS],
    len: usize,
}

/// Accumulated numeric parameters of one control sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    values: [u16; MAX_PARAMS],
    subs: [SubParams; MAX_PARAMS],
    /// Index of the parameter being accumulated
    index: usize,
    /// Digits currently go into the last sub-parameter of `index`
    in_sub: bool,
    /// Some digit or separator has been seen
    touched: bool,
    /// A `:` was seen anywhere in the sequence
    has_sub_params: bool,
    /// More parameters arrived than fit
    overflowed: bool,
    /// Digits of a sub-parameter past the ceiling
    discard: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            values: [0; MAX_PARAMS],
            subs: [SubParams::default(); MAX_PARAMS],
            index: 0,
            in_sub: false,
            touched: false,
            has_sub_params: false,
            overflowed: false,
            discard: false,
        }
    }
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, ready for a new sequence
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Accumulate one decimal digit into the current (sub-)parameter
    pub fn push_digit(&mut self, digit: u8) {
        self.touched = true;
        if self.overflowed || self.discard {
            return;
        }
        let digit = u16::from(digit);
        let slot = if self.in_sub {
            let sub = &mut self.subs[self.index];
            if sub.len == 0 {
                return;
            }
            &mut sub.values[sub.len - 1]
        } else {
            &mut self.values[self.index]
        };
        *slot = slot.saturating_mul(10).saturating_add(digit);
    }

    /// `;` finishes the current parameter
    pub fn next_param(&mut self) {
        self.touched = true;
        self.in_sub = false;
        self.discard = false;
        if self.index + 1 < MAX_PARAMS {
            self.index += 1;
        } else {
            self.overflowed = true;
        }
    }

    /// `:` opens a new sub-parameter of the current parameter
    pub fn next_sub_param(&mut self) {
        self.touched = true;
        self.has_sub_params = true;
        if self.overflowed {
            return;
        }
        let sub = &mut self.subs[self.index];
        if sub.len < MAX_SUB_PARAMS {
            sub.len += 1;
            self.in_sub = true;
        } else {
            self.discard = true;
        }
    }

    /// Number of parameters present (0 when the sequence had none)
    pub fn len(&self) -> usize {
        if self.touched {
            self.index + 1
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw value of parameter `i`, if present
    pub fn get(&self, i: usize) -> Option<u16> {
        (i < self.len()).then(|| self.values[i])
    }

    /// Value of parameter `i`, or `default` when absent or zero
    pub fn get_or(&self, i: usize, default: u16) -> u16 {
        match self.get(i) {
            Some(0) | None => default,
            Some(value) => value,
        }
    }

    /// Value of parameter `i`, or 0 when absent
    pub fn raw(&self, i: usize) -> u16 {
        self.get(i).unwrap_or(0)
    }

    /// Sub-parameters following parameter `i`
    pub fn sub_params(&self, i: usize) -> &[u16] {
        if i < self.len() {
            let sub = &self.subs[i];
            &sub.values[..sub.len]
        } else {
            &[]
        }
    }

    /// Whether any `:` separator was used
    pub fn has_sub_params(&self) -> bool {
        self.has_sub_params
    }

    /// Iterate over parameter values in order
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.values[..self.len()].iter().copied()
    }
}
