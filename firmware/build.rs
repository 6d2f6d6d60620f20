// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! This build script generates the `memory.x` linker script into a
//! directory where the linker can always find it at build time. The
//! application region starts past the S140 SoftDevice in flash, and the
//! SoftDevice's RAM carve-out is reserved at the bottom of RAM.

use consts::BASE_APP_ADDR;
use std::env;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

fn main() {
    // Put `memory.x` in our output directory and ensure it's
    // on the linker search path.
    let out = &PathBuf::from(env::var_os("OUT_DIR").unwrap());

    /* The S140 7.3.0 RAM requirement grows with the connection count; */
    /* four central links at ATT_MTU 247 fit comfortably in 24K (0x6000). */
    let soft_device_ram_reserved = 0x6000;

    let memory_x_content = format!(
        r##"
        BASE_APP_ADDR = {:#X};

        MEMORY
        {{
            /* NOTE 1 K = 1 KiBi = 1024 bytes */
            FLASH (rx) : ORIGIN = 0x00000000 + BASE_APP_ADDR, LENGTH = 1024K - {:#X}
            RAM : ORIGIN = 0x20000000 + {:#X}, LENGTH = 256K - {:#X}
        }}
        "##,
        BASE_APP_ADDR, BASE_APP_ADDR, soft_device_ram_reserved, soft_device_ram_reserved
    );
    File::create(out.join("./memory.x"))
        .unwrap()
        .write_all(memory_x_content.as_bytes())
        .unwrap();

    println!("cargo:rustc-link-search={}", out.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}
