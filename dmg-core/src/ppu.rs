//! Scanline renderer and LCD timing state machine.
//!
//! The PPU is stepped in dots (T-cycles). A scanline is 456 dots: 80 dots of
//! OAM scan, 172 of pixel transfer, then horizontal blank. Lines 144-153 are
//! vertical blank. Rendering happens a full scanline at a time on entry to
//! horizontal blank; per-dot FIFO behavior is not modeled.

use crate::memory::{address, AddressSpace};
use tinyvec::ArrayVec;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

pub const DOTS_PER_LINE: u32 = 456;
pub const LINES_PER_FRAME: u8 = 154;

const OAM_SCAN_DOTS: u32 = 80;
const RENDER_END_DOT: u32 = 252;

const FIRST_VBLANK_LINE: u8 = 144;

const MAX_SPRITES_PER_LINE: usize = 10;
const OAM_ENTRY_LEN: u16 = 4;
const OAM_ENTRIES: u16 = 40;

pub type FrameBuffer = [[u32; SCREEN_WIDTH]; SCREEN_HEIGHT];

// ARGB shades from lightest to darkest
const SHADES: [u32; 4] = [0xFFFF_FFFF, 0xFFAA_AAAA, 0xFF55_5555, 0xFF00_0000];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpuMode {
    HBlank,
    VBlank,
    ScanningOAM,
    RenderingScanline,
}

impl PpuMode {
    fn stat_bits(self) -> u8 {
        match self {
            Self::HBlank => 0x00,
            Self::VBlank => 0x01,
            Self::ScanningOAM => 0x02,
            Self::RenderingScanline => 0x03,
        }
    }
}

fn mode_for(scanline: u8, dot: u32) -> PpuMode {
    if scanline >= FIRST_VBLANK_LINE {
        PpuMode::VBlank
    } else if dot < OAM_SCAN_DOTS {
        PpuMode::ScanningOAM
    } else if dot < RENDER_END_DOT {
        PpuMode::RenderingScanline
    } else {
        PpuMode::HBlank
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct OamEntry {
    y: u8,
    x: u8,
    tile_index: u8,
    attributes: u8,
}

pub struct PpuState {
    scanline: u8,
    dot: u32,
    mode: PpuMode,
    frame_buffer: Box<FrameBuffer>,
    // Color indexes (pre-palette) for the line currently being assembled,
    // kept for sprite-behind-background priority
    bg_color_indexes: [u8; SCREEN_WIDTH],
    frame_complete: bool,
}

impl PpuState {
    pub fn new() -> Self {
        Self {
            scanline: 0,
            dot: 0,
            mode: PpuMode::ScanningOAM,
            frame_buffer: Box::new([[SHADES[0]; SCREEN_WIDTH]; SCREEN_HEIGHT]),
            bg_color_indexes: [0; SCREEN_WIDTH],
            frame_complete: false,
        }
    }

    pub fn mode(&self) -> PpuMode {
        self.mode
    }

    pub fn scanline(&self) -> u8 {
        self.scanline
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame_buffer
    }

    /// True once per frame, after the last visible scanline has been
    /// rendered. Cleared by `clear_frame_complete`.
    pub fn frame_complete(&self) -> bool {
        self.frame_complete
    }

    pub fn clear_frame_complete(&mut self) {
        self.frame_complete = false;
    }

    /// Advance the PPU by the given number of dots.
    pub fn tick(&mut self, dots: u32, address_space: &mut AddressSpace) {
        let lcdc = address_space.read_address_u8(address::LCDC_REGISTER);
        if lcdc & 0x80 == 0 {
            // LCD disabled: nothing advances, LY and STAT hold their values
            return;
        }

        let mut remaining = dots;
        while remaining > 0 {
            // Step at most to the next mode or line boundary so that every
            // transition is observed
            let boundary = if self.dot < OAM_SCAN_DOTS {
                OAM_SCAN_DOTS
            } else if self.dot < RENDER_END_DOT {
                RENDER_END_DOT
            } else {
                DOTS_PER_LINE
            };
            let step = remaining.min(boundary - self.dot);

            self.dot += step;
            remaining -= step;

            if self.dot == DOTS_PER_LINE {
                self.dot = 0;
                self.scanline += 1;
                if self.scanline == LINES_PER_FRAME {
                    self.scanline = 0;
                }
            }

            let new_mode = mode_for(self.scanline, self.dot);
            if new_mode != self.mode {
                self.mode_transition(new_mode, address_space);
                self.mode = new_mode;
            }

            self.sync_registers(address_space);
        }
    }

    fn mode_transition(&mut self, new_mode: PpuMode, address_space: &mut AddressSpace) {
        match new_mode {
            PpuMode::HBlank => {
                self.render_scanline(address_space);
            }
            PpuMode::VBlank => {
                log::trace!("entering VBlank");
                let interrupt_flags = address_space.read_address_u8(address::IF_REGISTER);
                address_space.write_address_u8(address::IF_REGISTER, interrupt_flags | 0x01);
                self.frame_complete = true;
            }
            PpuMode::ScanningOAM | PpuMode::RenderingScanline => {}
        }
    }

    // Keep LY and the read-only STAT bits in sync with internal state. The
    // interrupt-select bits (3-6) remain whatever the program last wrote.
    fn sync_registers(&self, address_space: &mut AddressSpace) {
        address_space.write_address_u8(address::LY_REGISTER, self.scanline);

        let lyc = address_space.read_address_u8(address::LYC_REGISTER);
        let stat = address_space.read_address_u8(address::STAT_REGISTER);
        let coincidence = u8::from(self.scanline == lyc) << 2;
        let new_stat = (stat & 0xF8) | coincidence | self.mode.stat_bits();
        address_space.write_address_u8(address::STAT_REGISTER, new_stat);
    }

    fn render_scanline(&mut self, address_space: &mut AddressSpace) {
        let line = self.scanline;
        if usize::from(line) >= SCREEN_HEIGHT {
            return;
        }

        let lcdc = address_space.read_address_u8(address::LCDC_REGISTER);

        self.bg_color_indexes = [0; SCREEN_WIDTH];
        self.frame_buffer[usize::from(line)] = [SHADES[0]; SCREEN_WIDTH];

        if lcdc & 0x01 != 0 {
            self.render_background_line(line, lcdc, address_space);
            if lcdc & 0x20 != 0 {
                self.render_window_line(line, lcdc, address_space);
            }
        }

        if lcdc & 0x02 != 0 {
            self.render_sprite_line(line, lcdc, address_space);
        }
    }

    fn render_background_line(&mut self, line: u8, lcdc: u8, address_space: &AddressSpace) {
        let scy = address_space.read_address_u8(address::SCY_REGISTER);
        let scx = address_space.read_address_u8(address::SCX_REGISTER);
        let bgp = address_space.read_address_u8(address::BGP_REGISTER);

        let tile_map = bg_tile_map_base(lcdc & 0x08 != 0);

        let bg_y = line.wrapping_add(scy);
        let tile_row = u16::from(bg_y / 8);
        let pixel_row = u16::from(bg_y % 8);

        for x in 0..SCREEN_WIDTH {
            let bg_x = (x as u8).wrapping_add(scx);
            let tile_col = u16::from(bg_x / 8);

            let tile_index = address_space.read_address_u8(tile_map + tile_row * 32 + tile_col);
            let tile_address = tile_data_address(lcdc & 0x10 != 0, tile_index);

            let lo = address_space.read_address_u8(tile_address + pixel_row * 2);
            let hi = address_space.read_address_u8(tile_address + pixel_row * 2 + 1);

            let bit = 7 - (bg_x % 8);
            let color_index = (((hi >> bit) & 0x01) << 1) | ((lo >> bit) & 0x01);

            self.bg_color_indexes[x] = color_index;
            self.frame_buffer[usize::from(line)][x] = resolve_shade(bgp, color_index);
        }
    }

    fn render_window_line(&mut self, line: u8, lcdc: u8, address_space: &AddressSpace) {
        let wy = address_space.read_address_u8(address::WY_REGISTER);
        let wx = address_space.read_address_u8(address::WX_REGISTER);
        let bgp = address_space.read_address_u8(address::BGP_REGISTER);

        if line < wy {
            return;
        }

        // WX holds the window's left edge plus 7
        let window_left = i32::from(wx) - 7;
        if window_left >= SCREEN_WIDTH as i32 {
            return;
        }

        let tile_map = bg_tile_map_base(lcdc & 0x40 != 0);

        let window_y = line - wy;
        let tile_row = u16::from(window_y / 8);
        let pixel_row = u16::from(window_y % 8);

        for x in window_left.max(0)..SCREEN_WIDTH as i32 {
            let window_x = (x - window_left) as u16;
            let tile_col = window_x / 8;

            let tile_index = address_space.read_address_u8(tile_map + tile_row * 32 + tile_col);
            let tile_address = tile_data_address(lcdc & 0x10 != 0, tile_index);

            let lo = address_space.read_address_u8(tile_address + pixel_row * 2);
            let hi = address_space.read_address_u8(tile_address + pixel_row * 2 + 1);

            let bit = 7 - (window_x % 8) as u8;
            let color_index = (((hi >> bit) & 0x01) << 1) | ((lo >> bit) & 0x01);

            self.bg_color_indexes[x as usize] = color_index;
            self.frame_buffer[usize::from(line)][x as usize] = resolve_shade(bgp, color_index);
        }
    }

    fn render_sprite_line(&mut self, line: u8, lcdc: u8, address_space: &AddressSpace) {
        let sprite_height: i32 = if lcdc & 0x04 != 0 { 16 } else { 8 };

        // First 10 sprites overlapping this line, in OAM order
        let mut sprites: ArrayVec<[OamEntry; MAX_SPRITES_PER_LINE]> = ArrayVec::new();
        for i in 0..OAM_ENTRIES {
            let entry_address = address::OAM_START + i * OAM_ENTRY_LEN;
            let y = address_space.read_address_u8(entry_address);

            let top = i32::from(y) - 16;
            if (top..top + sprite_height).contains(&i32::from(line)) {
                sprites.push(OamEntry {
                    y,
                    x: address_space.read_address_u8(entry_address + 1),
                    tile_index: address_space.read_address_u8(entry_address + 2),
                    attributes: address_space.read_address_u8(entry_address + 3),
                });
                if sprites.len() == MAX_SPRITES_PER_LINE {
                    break;
                }
            }
        }

        // Selected sprites are drawn in OAM order; where they overlap, the
        // later entry overwrites the earlier one
        for sprite in sprites.iter() {
            let behind_background = sprite.attributes & 0x80 != 0;
            let y_flip = sprite.attributes & 0x40 != 0;
            let x_flip = sprite.attributes & 0x20 != 0;
            let palette_address = if sprite.attributes & 0x10 != 0 {
                address::OBP1_REGISTER
            } else {
                address::OBP0_REGISTER
            };
            let palette = address_space.read_address_u8(palette_address);

            let mut sprite_row = (i32::from(line) - (i32::from(sprite.y) - 16)) as u16;
            if y_flip {
                sprite_row = (sprite_height as u16) - 1 - sprite_row;
            }

            // Tall sprites ignore the low bit of the tile index
            let tile_index = if sprite_height == 16 {
                sprite.tile_index & 0xFE
            } else {
                sprite.tile_index
            };
            let tile_address = 0x8000 + u16::from(tile_index) * 16;

            let lo = address_space.read_address_u8(tile_address + sprite_row * 2);
            let hi = address_space.read_address_u8(tile_address + sprite_row * 2 + 1);

            for pixel in 0..8_i32 {
                let screen_x = i32::from(sprite.x) - 8 + pixel;
                if !(0..SCREEN_WIDTH as i32).contains(&screen_x) {
                    continue;
                }

                let bit = if x_flip { pixel } else { 7 - pixel };
                let color_index = (((hi >> bit) & 0x01) << 1) | ((lo >> bit) & 0x01);

                // Color 0 is transparent for sprites
                if color_index == 0 {
                    continue;
                }

                if behind_background && self.bg_color_indexes[screen_x as usize] != 0 {
                    continue;
                }

                self.frame_buffer[usize::from(line)][screen_x as usize] =
                    resolve_shade(palette, color_index);
            }
        }
    }
}

impl Default for PpuState {
    fn default() -> Self {
        Self::new()
    }
}

fn bg_tile_map_base(high_map: bool) -> u16 {
    if high_map {
        0x9C00
    } else {
        0x9800
    }
}

// LCDC bit 4 selects between unsigned indexing from 0x8000 and signed
// indexing from 0x9000
fn tile_data_address(unsigned_indexing: bool, tile_index: u8) -> u16 {
    if unsigned_indexing {
        0x8000 + u16::from(tile_index) * 16
    } else {
        let offset_index = (tile_index as i8 as i16 + 128) as u16;
        0x8800 + offset_index * 16
    }
}

fn resolve_shade(palette: u8, color_index: u8) -> u32 {
    SHADES[usize::from((palette >> (2 * color_index)) & 0x03)]
}
