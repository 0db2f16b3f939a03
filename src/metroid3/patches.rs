//! Corrective patches applied when an image is opened
//!
//! Bug fixes correct tilemaps that reference the wrong palette or priority.
//! Improvements make the animation data consistent (distinct left/right
//! morph ball, cannon port placement) without changing gameplay.

use tracing::debug;

use crate::rom::{Encoding, Rom, RomError, Value};

/// Result of trying one patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub name: &'static str,
    pub addr: u32,
    /// Whether the bytes matched the vanilla values and were replaced
    pub applied: bool,
}

enum Patch {
    Bytes { name: &'static str, addr: u32, before: &'static [u8], after: &'static [u8] },
    Word { name: &'static str, addr: u32, before: u16, after: u16 },
}

const BUGFIXES: &[Patch] = &[
    // TM_193, last byte should be $28 like its neighbors
    Patch::Bytes {
        name: "TM_193 palette",
        addr: 0x92BEC1,
        before: &[0xF8, 0x01, 0xF8, 0x00, 0x30],
        after: &[0xF8, 0x01, 0xF8, 0x00, 0x28],
    },
    // TM_181
    Patch::Bytes {
        name: "TM_181 palette",
        addr: 0x92BC7C,
        before: &[0xF8, 0x01, 0xF8, 0x00, 0x10],
        after: &[0xF8, 0x01, 0xF8, 0x00, 0x28],
    },
    // TM_0DA, last byte should be $68
    Patch::Bytes {
        name: "TM_0DA palette",
        addr: 0x92AEE3,
        before: &[0xFD, 0x01, 0x0F, 0x0A, 0x78],
        after: &[0xFD, 0x01, 0x0F, 0x0A, 0x68],
    },
    // TM_06F, $38 like the other elevator poses
    Patch::Bytes {
        name: "TM_06F palette",
        addr: 0x92A12E,
        before: &[0xF8, 0x01, 0xF8, 0x00, 0x30],
        after: &[0xF8, 0x01, 0xF8, 0x00, 0x38],
    },
];

const IMPROVEMENTS: &[Patch] = &[
    // AFP_T31/AFP_T32 shared one entry, so midair morph ball looked the same both ways
    Patch::Word { name: "AFP_T32 morph ball", addr: 0x92D9B2, before: 0xE508, after: 0xE530 },
    Patch::Word { name: "morph ball upper tilemap", addr: 0x9292C7, before: 0x0710, after: 0x071A },
    Patch::Word { name: "morph ball lower tilemap", addr: 0x9294C1, before: 0x0710, after: 0x071A },
    // FD_6D..FD_70, $F0 is a terminator that only ever fires here
    Patch::Bytes {
        name: "FD_6D falling duration",
        addr: 0x91B361,
        before: &[0x02, 0xF0, 0x10, 0xFE, 0x01],
        after: &[0x02, 0x10, 0x10, 0xFE, 0x01],
    },
    // XY_P00, missile port drawn behind the fist in the elevator pose
    Patch::Bytes { name: "XY_P00 port layer", addr: 0x90C9DB, before: &[0x00, 0x02], after: &[0x00, 0x00] },
    // Downward aiming port placements point at new XY lists
    Patch::Word { name: "port list down right", addr: 0x90C80F, before: 0xCACB, after: 0xCB31 },
    Patch::Word { name: "port list down left", addr: 0x90C839, before: 0xCB31, after: 0xCAC5 },
    Patch::Word { name: "port list down left aim", addr: 0x90C83B, before: 0xCB37, after: 0xCB31 },
    Patch::Bytes {
        name: "XY list $CAC5",
        addr: 0x90CAC5,
        before: &[0x04, 0x01, 0x00, 0x0D, 0x00, 0x0D, 0x05, 0x01],
        after: &[0x83, 0x01, 0x84, 0x01, 0x0B, 0x01, 0x00, 0x0D],
    },
    Patch::Bytes {
        name: "XY list $CB31",
        addr: 0x90CB31,
        before: &[0x04, 0x01, 0x00, 0x09, 0x00, 0x09, 0x05, 0x01],
        after: &[0x86, 0x01, 0x85, 0x01, 0xED, 0x01, 0xF7, 0x0D],
    },
    // Jump begin/land port placement is always omitted
    Patch::Bytes { name: "XY $CAD1 jump port", addr: 0x90CAD1, before: &[0x03, 0x01], after: &[0x00, 0x00] },
    Patch::Bytes { name: "XY $CBF9 jump port", addr: 0x90CBF9, before: &[0x03, 0x01], after: &[0x00, 0x00] },
    Patch::Bytes { name: "XY $CC05 jump port", addr: 0x90CC05, before: &[0x03, 0x01], after: &[0x00, 0x00] },
    // XY_P49/XY_P4A, moonwalk cannon was mounted backwards
    Patch::Bytes {
        name: "XY_P49 moonwalk left",
        addr: 0x90CBA5,
        before: &[0x02, 0x01, 0xF1, 0xFD, 0xF1, 0xFC, 0xF1, 0xFC, 0xF1, 0xFD, 0xF1, 0xFC, 0xF1, 0xFC],
        after: &[0x07, 0x01, 0xED, 0xFD, 0xED, 0xFC, 0xED, 0xFC, 0xED, 0xFD, 0xED, 0xFC, 0xED, 0xFC],
    },
    Patch::Bytes {
        name: "XY_P4A moonwalk right",
        addr: 0x90CBB3,
        before: &[0x07, 0x01, 0x07, 0xFD, 0x07, 0xFC, 0x07, 0xFC, 0x07, 0xFD, 0x07, 0xFC, 0x07, 0xFC],
        after: &[0x02, 0x01, 0x0B, 0xFD, 0x0B, 0xFC, 0x0B, 0xFC, 0x0B, 0xFD, 0x0B, 0xFC, 0x0B, 0xFC],
    },
];

impl Patch {
    fn name(&self) -> &'static str {
        match self {
            Patch::Bytes { name, .. } | Patch::Word { name, .. } => *name,
        }
    }

    fn addr(&self) -> u32 {
        match self {
            Patch::Bytes { addr, .. } | Patch::Word { addr, .. } => *addr,
        }
    }

    fn apply(&self, rom: &mut Rom) -> Result<bool, RomError> {
        match self {
            Patch::Bytes { addr, before, after, .. } => rom.verified_write(
                *addr,
                &Encoding::bytes(before.len()),
                &Value::bytes(before),
                &Value::bytes(after),
            ),
            Patch::Word { addr, before, after, .. } => rom.verified_write(
                *addr,
                &Encoding::Single(2),
                &Value::Single(*before as u32),
                &Value::Single(*after as u32),
            ),
        }
    }
}

/// Apply the bug fixes, then the improvements.
pub(crate) fn apply_all(rom: &mut Rom) -> Result<Vec<PatchOutcome>, RomError> {
    BUGFIXES
        .iter()
        .chain(IMPROVEMENTS)
        .map(|patch| {
            let applied = patch.apply(rom)?;
            debug!("Patch '{}' at ${:06X}: {}", patch.name(), patch.addr(), if applied { "applied" } else { "skipped" });
            Ok(PatchOutcome { name: patch.name(), addr: patch.addr(), applied })
        })
        .collect()
}

/// An image holding the bytes every patch expects to replace.
#[cfg(test)]
pub(crate) fn vanilla() -> crate::testing::RomBuilder {
    let mut builder = crate::testing::RomBuilder::lorom(0x200000);
    for patch in BUGFIXES.iter().chain(IMPROVEMENTS) {
        builder = match patch {
            Patch::Bytes { addr, before, .. } => builder.put(*addr, before),
            Patch::Word { addr, before, .. } => builder.put_words(*addr, &[*before]),
        };
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RomBuilder;

    #[test]
    fn test_patches_apply_to_vanilla_bytes() {
        let mut rom = vanilla().build();
        let outcomes = apply_all(&mut rom).unwrap();
        assert_eq!(outcomes.len(), BUGFIXES.len() + IMPROVEMENTS.len());
        assert!(outcomes.iter().all(|o| o.applied));
        assert_eq!(rom.read_bytes(0x92BEC1, 5).unwrap(), &[0xF8, 0x01, 0xF8, 0x00, 0x28]);
        assert_eq!(rom.read_u16(0x92D9B2).unwrap(), 0xE530);
        assert_eq!(rom.read_bytes(0x90CBB3, 2).unwrap(), &[0x02, 0x01]);
    }

    #[test]
    fn test_patches_are_idempotent() {
        let mut rom = vanilla().build();
        apply_all(&mut rom).unwrap();
        let once = rom.as_bytes().to_vec();

        let outcomes = apply_all(&mut rom).unwrap();
        assert!(outcomes.iter().all(|o| !o.applied));
        assert_eq!(rom.as_bytes(), once.as_slice());
    }

    #[test]
    fn test_unexpected_bytes_are_left_alone() {
        let mut rom = RomBuilder::lorom(0x200000).build();
        let before = rom.as_bytes().to_vec();
        let outcomes = apply_all(&mut rom).unwrap();
        assert!(outcomes.iter().all(|o| !o.applied));
        assert_eq!(rom.as_bytes(), before.as_slice());
    }

    #[test]
    fn test_patches_fail_on_small_images() {
        let mut rom = RomBuilder::lorom(0x10000).build();
        assert!(matches!(apply_all(&mut rom), Err(RomError::OutOfBounds { .. })));
    }
}
