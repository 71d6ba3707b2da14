/// Defines a small `Copy` bitmask type over an integer representation, in
/// the same spirit as a hand-rolled `SettingsFlags`: named constants, a
/// `contains` check, and `BitOr` for combining them.
macro_rules! bitmask {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $repr:ty {
            $( $(#[$fmeta:meta])* const $flag:ident = $value:expr; )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Default, Hash)]
        $vis struct $name($repr);

        impl $name {
            $( $(#[$fmeta])* pub const $flag: $name = $name($value); )*

            /// Returns true iff every bit set in `other` is also set here.
            pub const fn contains(self, other: $name) -> bool {
                self.0 & other.0 == other.0
            }

            /// Sets the bits of `other`, leaving any already-set bits alone.
            pub fn insert(&mut self, other: $name) {
                self.0 |= other.0;
            }
        }

        impl std::ops::BitOr for $name {
            type Output = $name;

            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(fmt, "{}({:#x})", stringify!($name), self.0)
            }
        }
    };
}

pub(crate) use bitmask;
