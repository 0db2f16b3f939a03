//! Palette registry and animation decoders
//!
//! Every palette kind is a base address (one per suit, or a single one) and a
//! decoder that knows how that effect is laid out: a static palette, a
//! microcode-driven rotation, a fixed frame sequence found by frame advancing,
//! or a composition of other palettes.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::{ExtractError, Metroid3Rom};
use crate::rom::RomError;

const PALETTE_COLORS: usize = 0x10;
const DEATH_SCHEDULE: u32 = 0x9BB823;
const SHIP_UNDERGLOW: u32 = 0x8DCA4E;

/// Samus' suit, which selects between per-suit palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suit {
    Power,
    Varia,
    Gravity,
}

impl Suit {
    pub const ALL: [Suit; 3] = [Suit::Power, Suit::Varia, Suit::Gravity];

    pub fn name(self) -> &'static str {
        match self {
            Suit::Power => "power",
            Suit::Varia => "varia",
            Suit::Gravity => "gravity",
        }
    }

    fn pick(self, [power, varia, gravity]: [u32; 3]) -> u32 {
        match self {
            Suit::Power => power,
            Suit::Varia => varia,
            Suit::Gravity => gravity,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Suit {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Suit::ALL
            .into_iter()
            .find(|suit| suit.name() == s)
            .ok_or_else(|| ExtractError::InvalidVariant(format!("unknown suit type '{}'", s)))
    }
}

/// One step of a palette animation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaletteFrame {
    /// Frames to show this palette, 0 holds it forever
    pub duration: u16,
    /// RGB555 colors
    pub colors: Vec<u16>,
    /// Where the colors were read from, when they come from one place
    pub address: Option<u32>,
}

/// Every palette effect that can be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaletteKind {
    Standard,
    Loader,
    Heat,
    Charge,
    SpeedBoost,
    SpeedSquat,
    Shinespark,
    ScrewAttack,
    HyperBeam,
    DeathSuit,
    DeathFlesh,
    CrystalFlash,
    Sepia,
    SepiaHurt,
    SepiaAlternate,
    Door,
    Xray,
    FileSelect,
    Ship,
    IntroShip,
    OutroShip,
}

enum Base {
    Suited([u32; 3]),
    Single(u32),
}

enum Decoder {
    Static,
    Loader,
    Heat,
    /// Raw palettes at `0x20` strides, shown in `order`, optionally followed
    /// by one palette held forever
    Sequence { order: &'static [u32], duration: u16, hold: Option<u32> },
    DeathSuit,
    DeathFlesh,
    Xray,
    Ship,
    Door,
    OutroShip,
}

const STANDARD: [u32; 3] = [0x9B9400, 0x9B9520, 0x9B9800];

impl PaletteKind {
    pub const ALL: [PaletteKind; 21] = [
        PaletteKind::Standard,
        PaletteKind::Loader,
        PaletteKind::Heat,
        PaletteKind::Charge,
        PaletteKind::SpeedBoost,
        PaletteKind::SpeedSquat,
        PaletteKind::Shinespark,
        PaletteKind::ScrewAttack,
        PaletteKind::HyperBeam,
        PaletteKind::DeathSuit,
        PaletteKind::DeathFlesh,
        PaletteKind::CrystalFlash,
        PaletteKind::Sepia,
        PaletteKind::SepiaHurt,
        PaletteKind::SepiaAlternate,
        PaletteKind::Door,
        PaletteKind::Xray,
        PaletteKind::FileSelect,
        PaletteKind::Ship,
        PaletteKind::IntroShip,
        PaletteKind::OutroShip,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PaletteKind::Standard => "standard",
            PaletteKind::Loader => "loader",
            PaletteKind::Heat => "heat",
            PaletteKind::Charge => "charge",
            PaletteKind::SpeedBoost => "speed_boost",
            PaletteKind::SpeedSquat => "speed_squat",
            PaletteKind::Shinespark => "shinespark",
            PaletteKind::ScrewAttack => "screw_attack",
            PaletteKind::HyperBeam => "hyper_beam",
            PaletteKind::DeathSuit => "death_suit",
            PaletteKind::DeathFlesh => "death_flesh",
            PaletteKind::CrystalFlash => "crystal_flash",
            PaletteKind::Sepia => "sepia",
            PaletteKind::SepiaHurt => "sepia_hurt",
            PaletteKind::SepiaAlternate => "sepia_alternate",
            PaletteKind::Door => "door",
            PaletteKind::Xray => "xray",
            PaletteKind::FileSelect => "file_select",
            PaletteKind::Ship => "ship",
            PaletteKind::IntroShip => "intro_ship",
            PaletteKind::OutroShip => "outro_ship",
        }
    }

    /// Whether this kind has one palette per suit.
    pub fn is_suited(self) -> bool {
        matches!(self.layout().0, Base::Suited(_))
    }

    fn layout(self) -> (Base, Decoder) {
        use Base::{Single, Suited};

        const ONCE_EACH: &[u32] = &[0, 1, 2, 3, 2, 1];

        match self {
            PaletteKind::Standard => (Suited(STANDARD), Decoder::Static),
            PaletteKind::Loader => (Suited([0x8DDB62, 0x8DDCC8, 0x8DDE2E]), Decoder::Loader),
            PaletteKind::Heat => (Suited([0x8DE45E, 0x8DE68A, 0x8DE8B6]), Decoder::Heat),
            // Advances every frame
            PaletteKind::Charge => (
                Suited([0x9B9820, 0x9B9920, 0x9B9A20]),
                Decoder::Sequence { order: &[0, 1, 2, 3, 4, 5, 6, 7], duration: 1, hold: None },
            ),
            // Warm up, then stays on the last palette
            PaletteKind::SpeedBoost => (
                Suited([0x9B9B20, 0x9B9D20, 0x9B9F20]),
                Decoder::Sequence { order: &[0, 1, 2], duration: 4, hold: Some(3) },
            ),
            PaletteKind::SpeedSquat => (
                Suited([0x9B9BA0, 0x9B9DA0, 0x9B9FA0]),
                Decoder::Sequence { order: ONCE_EACH, duration: 1, hold: None },
            ),
            PaletteKind::Shinespark => (
                Suited([0x9B9C20, 0x9B9E20, 0x9BA020]),
                Decoder::Sequence { order: &[0, 1, 2, 3], duration: 1, hold: None },
            ),
            PaletteKind::ScrewAttack => (
                Suited([0x9B9CA0, 0x9B9EA0, 0x9BA0A0]),
                Decoder::Sequence { order: ONCE_EACH, duration: 1, hold: None },
            ),
            PaletteKind::HyperBeam => (
                Single(0x9BA240),
                Decoder::Sequence { order: &[9, 8, 7, 6, 5, 4, 3, 2, 1, 0], duration: 2, hold: None },
            ),
            PaletteKind::DeathSuit => (Suited([0x9BB7D3, 0x9BB7E7, 0x9BB7FB]), Decoder::DeathSuit),
            PaletteKind::DeathFlesh => (Single(0x9BB80F), Decoder::DeathFlesh),
            PaletteKind::CrystalFlash => (
                Single(0x9B96C0),
                Decoder::Sequence { order: &[0, 1, 2, 3, 4, 5], duration: 2, hold: None },
            ),
            PaletteKind::Sepia => (Single(0x8CE569), Decoder::Static),
            PaletteKind::SepiaHurt => (Single(0x9BA380), Decoder::Static),
            PaletteKind::SepiaAlternate => (Single(0x9BA3A0), Decoder::Static),
            PaletteKind::Door => (Single(0x82E52C), Decoder::Door),
            PaletteKind::Xray => (Suited(STANDARD), Decoder::Xray),
            PaletteKind::FileSelect => (Single(0x8EE5E0), Decoder::Static),
            PaletteKind::Ship => (Single(0xA2A59E), Decoder::Ship),
            // The thrusters alternate white and black every frame, which is
            // left out
            PaletteKind::IntroShip => (Single(0x8CE689), Decoder::Static),
            PaletteKind::OutroShip => (Single(0x8DD6BA), Decoder::OutroShip),
        }
    }
}

impl fmt::Display for PaletteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PaletteKind {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaletteKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ExtractError::UnknownPaletteKind(s.to_string()))
    }
}

impl Metroid3Rom {
    /// Frames of a palette effect.
    pub fn palette(&self, kind: PaletteKind, suit: Option<Suit>) -> Result<Vec<PaletteFrame>, ExtractError> {
        let (base, decoder) = kind.layout();
        let addr = match (base, suit) {
            (Base::Suited(addrs), Some(suit)) => suit.pick(addrs),
            (Base::Suited(_), None) => {
                return Err(ExtractError::InvalidVariant(format!("{} palette needs a suit type", kind)))
            }
            (Base::Single(addr), None) => addr,
            (Base::Single(_), Some(suit)) => {
                return Err(ExtractError::InvalidVariant(format!(
                    "{} palette called with suit type {} when none was expected",
                    kind, suit
                )))
            }
        };

        let frames = match decoder {
            Decoder::Static => vec![self.static_palette(addr)?],
            Decoder::Loader => self.loader_palettes(addr)?,
            // Heat palettes have no transparent color, the duration word takes its slot
            Decoder::Heat => self.timed_palettes(addr + 8, 16, true)?,
            Decoder::Sequence { order, duration, hold } => {
                let mut frames = order
                    .iter()
                    .map(|&i| self.raw_frame(addr + i * 0x20, duration))
                    .collect::<Result<Vec<_>, _>>()?;
                if let Some(i) = hold {
                    frames.push(self.raw_frame(addr + i * 0x20, 0)?);
                }
                frames
            }
            Decoder::DeathSuit => self.death_palettes(addr, false)?,
            Decoder::DeathFlesh => self.death_palettes(addr, true)?,
            Decoder::Xray => {
                let standard = self.static_palette(addr)?;
                self.nightvisor_colors()?
                    .into_iter()
                    .map(|visor| {
                        let mut colors = standard.colors.clone();
                        colors[4] = visor;
                        PaletteFrame { duration: 6, colors, address: None }
                    })
                    .collect()
            }
            Decoder::Ship => self.ship_palettes(addr)?,
            Decoder::Door => {
                // Black base, the game actually fades up into the suit colors
                let mut colors = vec![0; PALETTE_COLORS];
                colors[4] = self.rom().read_u16(addr)?;
                vec![PaletteFrame { duration: 0, colors, address: None }]
            }
            Decoder::OutroShip => self.timed_palettes(addr + 4, 16, false)?,
        };
        Ok(frames)
    }

    /// [`Metroid3Rom::palette`] with the kind and suit given by name.
    pub fn palette_by_name(&self, kind: &str, suit: Option<&str>) -> Result<Vec<PaletteFrame>, ExtractError> {
        let kind: PaletteKind = kind.parse()?;
        if !kind.is_suited() {
            if let Some(suit) = suit {
                return Err(ExtractError::InvalidVariant(format!(
                    "{} palette called with suit type {} when none was expected",
                    kind, suit
                )));
            }
        }
        let suit = suit.map(str::parse::<Suit>).transpose()?;
        self.palette(kind, suit)
    }

    fn raw_palette(&self, addr: u32) -> Result<Vec<u16>, RomError> {
        self.rom().read_words(addr, PALETTE_COLORS)
    }

    fn raw_frame(&self, addr: u32, duration: u16) -> Result<PaletteFrame, RomError> {
        Ok(PaletteFrame { duration, colors: self.raw_palette(addr)?, address: Some(addr) })
    }

    fn static_palette(&self, addr: u32) -> Result<PaletteFrame, RomError> {
        self.raw_frame(addr, 0)
    }

    /// A duration word followed by a palette. Without a transparent color the
    /// duration word is read as color 0.
    fn timed_palette(&self, addr: u32, add_transparency: bool) -> Result<PaletteFrame, RomError> {
        let duration = self.rom().read_u16(addr)?;
        let colors_addr = if add_transparency { addr } else { addr + 2 };
        self.raw_frame(colors_addr, duration)
    }

    /// Consecutive timed palettes, each followed by a control word.
    fn timed_palettes(&self, addr: u32, count: u32, add_transparency: bool) -> Result<Vec<PaletteFrame>, RomError> {
        let stride = if add_transparency { 0x22 } else { 0x24 };
        (0..count)
            .map(|i| self.timed_palette(addr + stride * i, add_transparency))
            .collect()
    }

    /// Four cycles of two palettes each repeated by a counter, then one
    /// closing palette. A final frame holds the first palette so the
    /// animation does not flash forever.
    fn loader_palettes(&self, base: u32) -> Result<Vec<PaletteFrame>, RomError> {
        let mut addr = base;
        let mut frames = Vec::new();

        for _ in 0..4 {
            let counter = self.rom().read_u8(addr + 6)?;
            addr += 7;
            let cycle = [self.timed_palette(addr, false)?, self.timed_palette(addr + 0x24, false)?];
            addr += 2 * 0x24;
            for _ in 0..counter {
                frames.extend(cycle.iter().cloned());
            }
        }

        addr += 4;
        let closing = self.timed_palette(addr, false)?;
        frames.push(closing);

        let first = frames[0].clone();
        frames.push(PaletteFrame { duration: 0, ..first });
        Ok(frames)
    }

    /// Nine steps scheduled at `$9BB823`, each picking one of ten palette
    /// pointers. The suit variant only reports the pointer.
    fn death_palettes(&self, table: u32, read_colors: bool) -> Result<Vec<PaletteFrame>, RomError> {
        let rom = self.rom();
        let pointers: Vec<u32> = rom
            .read_words(table, 10)?
            .into_iter()
            .map(|offset| 0x9B0000 + offset as u32)
            .collect();

        (0..9)
            .map(|i| {
                let step = rom.read_fields(DEATH_SCHEDULE + 2 * i, &[1, 1])?;
                let duration = step[0] as u16;
                let address = pointers.get(step[1] as usize).copied();
                let colors = match address {
                    Some(addr) if read_colors => self.raw_palette(addr)?,
                    _ => Vec::new(),
                };
                Ok(PaletteFrame { duration, colors, address })
            })
            .collect()
    }

    /// Fifteen fixed colors plus an underglow color stepped through a list
    /// of `(duration, color, control)` triples.
    fn ship_palettes(&self, addr: u32) -> Result<Vec<PaletteFrame>, RomError> {
        let rom = self.rom();
        let base = rom.read_words(addr, 15)?;
        let glow = SHIP_UNDERGLOW + 4;

        (0..14)
            .map(|i| {
                let step = rom.read_fields(glow + 6 * i, &[2, 2])?;
                let mut colors = base.clone();
                colors.push(step[1] as u16);
                Ok(PaletteFrame { duration: step[0] as u16, colors, address: None })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RomBuilder;

    fn words(start: u16) -> Vec<u16> {
        (start..start + 16).collect()
    }

    fn extractor(builder: RomBuilder) -> Metroid3Rom {
        Metroid3Rom::new(builder.build()).unwrap()
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in PaletteKind::ALL {
            assert_eq!(kind.name().parse::<PaletteKind>().unwrap(), kind);
        }
        assert_eq!(
            "rainbow".parse::<PaletteKind>(),
            Err(ExtractError::UnknownPaletteKind("rainbow".to_string()))
        );
    }

    #[test]
    fn test_standard_palette() {
        let rom = extractor(RomBuilder::lorom(0x200000).put_words(0x9B9520, &words(0x100)));
        let frames = rom.palette(PaletteKind::Standard, Some(Suit::Varia)).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].duration, 0);
        assert_eq!(frames[0].colors, words(0x100));
        assert_eq!(frames[0].address, Some(0x9B9520));
    }

    #[test]
    fn test_variant_errors() {
        let rom = extractor(RomBuilder::lorom(0x200000));
        assert!(matches!(rom.palette(PaletteKind::Standard, None), Err(ExtractError::InvalidVariant(_))));
        assert!(matches!(
            rom.palette(PaletteKind::Sepia, Some(Suit::Power)),
            Err(ExtractError::InvalidVariant(_))
        ));
        assert!(matches!(
            rom.palette_by_name("standard", Some("fusion")),
            Err(ExtractError::InvalidVariant(_))
        ));
        assert!(matches!(
            rom.palette_by_name("door", Some("fusion")),
            Err(ExtractError::InvalidVariant(_))
        ));
        assert!(matches!(rom.palette_by_name("glow", None), Err(ExtractError::UnknownPaletteKind(_))));
        assert!(rom.palette_by_name("sepia", None).is_ok());
    }

    #[test]
    fn test_fixed_sequences() {
        let rom = extractor(RomBuilder::lorom(0x200000));
        let count = |kind, suit| rom.palette(kind, suit).unwrap().len();
        assert_eq!(count(PaletteKind::Charge, Some(Suit::Power)), 8);
        assert_eq!(count(PaletteKind::SpeedBoost, Some(Suit::Power)), 4);
        assert_eq!(count(PaletteKind::SpeedSquat, Some(Suit::Gravity)), 6);
        assert_eq!(count(PaletteKind::Shinespark, Some(Suit::Varia)), 4);
        assert_eq!(count(PaletteKind::ScrewAttack, Some(Suit::Power)), 6);
        assert_eq!(count(PaletteKind::HyperBeam, None), 10);
        assert_eq!(count(PaletteKind::CrystalFlash, None), 6);
    }

    #[test]
    fn test_speed_boost_holds_last() {
        let rom = extractor(RomBuilder::lorom(0x200000).put_words(0x9B9B20 + 0x60, &words(0x300)));
        let frames = rom.palette(PaletteKind::SpeedBoost, Some(Suit::Power)).unwrap();
        let durations: Vec<u16> = frames.iter().map(|f| f.duration).collect();
        assert_eq!(durations, vec![4, 4, 4, 0]);
        assert_eq!(frames[3].colors, words(0x300));
    }

    #[test]
    fn test_hyper_beam_counts_down() {
        let rom = extractor(RomBuilder::lorom(0x200000));
        let frames = rom.palette(PaletteKind::HyperBeam, None).unwrap();
        assert_eq!(frames[0].address, Some(0x9BA240 + 9 * 0x20));
        assert_eq!(frames[9].address, Some(0x9BA240));
        assert!(frames.iter().all(|f| f.duration == 2));
    }

    #[test]
    fn test_heat_reads_duration_as_color() {
        let rom = extractor(
            RomBuilder::lorom(0x200000)
                .put_words(0x8DE45E + 8, &[0x0010])
                .put_words(0x8DE45E + 8 + 0x22, &[0x0020]),
        );
        let frames = rom.palette(PaletteKind::Heat, Some(Suit::Power)).unwrap();
        assert_eq!(frames.len(), 16);
        assert_eq!(frames[0].duration, 0x10);
        assert_eq!(frames[0].colors[0], 0x10);
        assert_eq!(frames[1].duration, 0x20);
        assert_eq!(frames[1].colors.len(), 16);
    }

    #[test]
    fn test_outro_ship_stride() {
        let rom = extractor(
            RomBuilder::lorom(0x200000)
                .put_words(0x8DD6BA + 4, &[5, 0x7FFF])
                .put_words(0x8DD6BA + 4 + 0x24, &[6]),
        );
        let frames = rom.palette(PaletteKind::OutroShip, None).unwrap();
        assert_eq!(frames.len(), 16);
        assert_eq!((frames[0].duration, frames[0].colors[0]), (5, 0x7FFF));
        assert_eq!(frames[1].duration, 6);
    }

    #[test]
    fn test_loader_cycles() {
        let base = 0x8DDB62;
        let mut builder = RomBuilder::lorom(0x200000);
        let mut addr = base;
        // counters 2, 0, 1, 0
        for (cycle, counter) in [2u8, 0, 1, 0].into_iter().enumerate() {
            builder = builder.put(addr + 6, &[counter]);
            addr += 7;
            let tag = 0x10 * cycle as u16;
            builder = builder.put_words(addr, &[3, tag]).put_words(addr + 0x24, &[5, tag + 1]);
            addr += 0x48;
        }
        builder = builder.put_words(addr + 4, &[9, 0x7C00]);

        let rom = extractor(builder);
        let frames = rom.palette(PaletteKind::Loader, Some(Suit::Power)).unwrap();
        let summary: Vec<(u16, u16)> = frames.iter().map(|f| (f.duration, f.colors[0])).collect();
        assert_eq!(
            summary,
            vec![(3, 0x00), (5, 0x01), (3, 0x00), (5, 0x01), (3, 0x20), (5, 0x21), (9, 0x7C00), (0, 0x00)]
        );
        assert_eq!(frames.last().unwrap().address, frames[0].address);
    }

    fn death_fixture() -> RomBuilder {
        let pointers: Vec<u16> = (0..10).map(|i| 0xC000 + 0x20 * i).collect();
        let mut builder = RomBuilder::lorom(0x200000)
            .put_words(0x9BB80F, &pointers)
            .put_words(0x9BB7D3, &pointers)
            .put_words(0x9BC000 + 0x20 * 3, &words(0x500));
        for i in 0..9u32 {
            builder = builder.put(DEATH_SCHEDULE + 2 * i, &[(i + 1) as u8, 3]);
        }
        builder
    }

    #[test]
    fn test_death_flesh_reads_colors() {
        let rom = extractor(death_fixture());
        let frames = rom.palette(PaletteKind::DeathFlesh, None).unwrap();
        assert_eq!(frames.len(), 9);
        assert_eq!(frames[0].duration, 1);
        assert_eq!(frames[8].duration, 9);
        assert_eq!(frames[0].colors, words(0x500));
        assert_eq!(frames[0].address, Some(0x9BC060));
    }

    #[test]
    fn test_death_suit_reports_pointer_only() {
        let rom = extractor(death_fixture());
        let frames = rom.palette(PaletteKind::DeathSuit, Some(Suit::Power)).unwrap();
        assert_eq!(frames.len(), 9);
        assert!(frames.iter().all(|f| f.colors.is_empty()));
        assert_eq!(frames[4].address, Some(0x9BC060));
    }

    #[test]
    fn test_xray_replaces_visor_color() {
        let rom = extractor(
            RomBuilder::lorom(0x200000)
                .put_words(0x9B9800, &words(0x40))
                .put_words(0x9BA3C6, &[0x1111, 0x2222, 0x3333]),
        );
        let frames = rom.palette(PaletteKind::Xray, Some(Suit::Gravity)).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.duration == 6));
        assert_eq!(frames[1].colors[4], 0x2222);
        assert_eq!(frames[1].colors[5], 0x45);
        assert!(matches!(rom.palette(PaletteKind::Xray, None), Err(ExtractError::InvalidVariant(_))));
    }

    #[test]
    fn test_ship_appends_glow() {
        let rom = extractor(
            RomBuilder::lorom(0x200000)
                .put_words(0xA2A59E, &words(0x60)[..15])
                .put_words(SHIP_UNDERGLOW + 4 + 6 * 7, &[8, 0x03E0, 0xFFFF]),
        );
        let frames = rom.palette(PaletteKind::Ship, None).unwrap();
        assert_eq!(frames.len(), 14);
        assert_eq!(frames[7].colors.len(), 16);
        assert_eq!(frames[7].colors[15], 0x03E0);
        assert_eq!(frames[7].duration, 8);
        assert_eq!(frames[7].colors[14], 0x6E);
    }

    #[test]
    fn test_door_palette() {
        let rom = extractor(RomBuilder::lorom(0x200000).put_words(0x82E52C, &[0x4321]));
        let frames = rom.palette(PaletteKind::Door, None).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].duration, 0);
        assert_eq!(frames[0].colors.len(), 16);
        assert_eq!(frames[0].colors[4], 0x4321);
        assert_eq!(frames[0].colors.iter().filter(|&&c| c != 0).count(), 1);
    }
}
