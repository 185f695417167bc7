// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bracket depth scanner.

/// Opening and closing bracket pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Brackets {
    pub open: u8,
    pub close: u8,
}

pub const BRACES: Brackets = Brackets { open: b'{', close: b'}' };
pub const PARENS: Brackets = Brackets { open: b'(', close: b')' };

/// Return the byte index of the bracket closing the one found at
/// `start`.
///
/// Returns `None` if `start` does not point at an opening bracket or
/// if the input ends before the depth returns to zero.
pub fn match_bracket(text: &str, start: usize, brackets: Brackets) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&brackets.open) {
        return None;
    }
    let mut depth = 0usize;
    for (index, byte) in bytes.iter().enumerate().skip(start) {
        if *byte == brackets.open {
            depth += 1;
        } else if *byte == brackets.close {
            depth -= 1;
            if depth == 0 {
                return Some(index);
            }
        }
    }
    None
}

/// Find the first opening bracket at or after `from` and return the
/// range of its contents, excluding both brackets.
///
/// Returns `Err(open)` with the offset of the opening bracket when it
/// is never closed, and `Ok(None)` when there is no opening bracket.
pub fn find_block(
    text: &str,
    from: usize,
    brackets: Brackets,
) -> Result<Option<std::ops::Range<usize>>, usize> {
    let tail = text.as_bytes().get(from..).unwrap_or_default();
    let Some(open) = tail.iter().position(|b| *b == brackets.open) else {
        return Ok(None);
    };
    let open = from + open;
    match match_bracket(text, open, brackets) {
        Some(close) => Ok(Some(open + 1..close)),
        None => Err(open),
    }
}
