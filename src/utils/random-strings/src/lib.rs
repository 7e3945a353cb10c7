// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use rand::Rng;
use rand::distributions::{Alphanumeric, Uniform};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

const ASCII_SYMBOLS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!#$%&*+-.:;<=>?@^_~";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub enum AllowedSymbols {
    Alphanumeric,
    AsciiSymbols,
}

/// Generates a random string from a cryptographically secure generator
/// (`thread_rng` is a CSPRNG reseeded from the OS)
pub fn get_random_string(
    prefix: Option<&str>,
    len: usize,
    allowed_symbols: &AllowedSymbols,
) -> String {
    let mut rng = rand::thread_rng();

    let mut name = String::with_capacity(len + prefix.map_or(0, str::len));
    if let Some(prefix) = prefix {
        name.push_str(prefix);
    }

    match allowed_symbols {
        AllowedSymbols::Alphanumeric => {
            name.extend(
                (&mut rng)
                    .sample_iter(&Alphanumeric)
                    .take(len)
                    .map(char::from),
            );
        }
        AllowedSymbols::AsciiSymbols => {
            let range = Uniform::new(0, ASCII_SYMBOLS.len());
            name.extend(
                (&mut rng)
                    .sample_iter(range)
                    .take(len)
                    .map(|i| char::from(ASCII_SYMBOLS[i])),
            );
        }
    }

    name
}

pub fn get_random_name(prefix: Option<&str>, len: usize) -> String {
    get_random_string(prefix, len, &AllowedSymbols::Alphanumeric)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
