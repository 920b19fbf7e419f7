// SPDX-License-Identifier: MIT

/// Defines the FDP log page identifiers served by the device.
///
/// For each entry this generates:
/// - `pub const LID_<NAME>: u16`
/// - a `LogId` variant, with `from_lid`, `lid`, `min_len` and `Display`
///
/// `min_len` is the shortest transfer the page accepts; shorter requests
/// cannot hold the page header and are rejected.
///
/// # Example
/// ```rust,ignore
/// define_log_ids! {
///     FDP_STATS => FdpStats, 0x21, "FDP statistics", 8,
/// }
/// ```
macro_rules! define_log_ids {
    (
        $(
            $name:ident => $variant:ident, $lid:expr, $desc:expr, $min:expr
        ),+ $(,)?
    ) => {
        paste::paste! {
            $(
                #[doc = $desc]
                pub const [<LID_ $name>]: u16 = $lid;
            )+

            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub enum LogId {
                $($variant,)+
            }

            impl LogId {
                pub fn from_lid(lid: u16) -> Option<Self> {
                    match lid {
                        $(l if l == [<LID_ $name>] => Some(Self::$variant),)+
                        _ => None,
                    }
                }

                pub fn lid(&self) -> u16 {
                    match self {
                        $(Self::$variant => [<LID_ $name>],)+
                    }
                }

                pub fn min_len(&self) -> u32 {
                    match self {
                        $(Self::$variant => $min,)+
                    }
                }
            }

            impl core::fmt::Display for LogId {
                fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                    match self {
                        $(Self::$variant => f.write_str($desc),)+
                    }
                }
            }
        }
    };
}
