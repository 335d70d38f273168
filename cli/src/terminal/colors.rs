// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use colored::Color;

/// Body text.
pub const TEXT_DEFAULT: Color = Color::TrueColor { r: 212, g: 212, b: 212 };
pub const SEPARATOR: Color = Color::BrightBlack;

/// Interface names and section keys.
pub const PRIMARY: Color = Color::TrueColor { r: 255, g: 204, b: 102 };
pub const SECONDARY: Color = Color::TrueColor { r: 102, g: 204, b: 255 };
pub const ACCENT: Color = Color::TrueColor { r: 170, g: 170, b: 0 };

pub const IPV4_ADDR: Color = Color::TrueColor { r: 170, g: 255, b: 170 };
pub const IPV4_PREFIX: Color = Color::TrueColor { r: 190, g: 255, b: 190 };
pub const PEER_ADDR: Color = Color::TrueColor { r: 255, g: 102, b: 178 };
pub const MAC_ADDR: Color = Color::TrueColor { r: 255, g: 165, b: 0 };

// Kill switch state
pub const ENFORCED: Color = Color::TrueColor { r: 120, g: 220, b: 120 };
pub const OPEN: Color = Color::TrueColor { r: 240, g: 90, b: 90 };
