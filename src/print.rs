use crate::address::{Address, FriendlyFormat};
use std::io::{self, Write};

const SEPARATOR_WIDTH: usize = 89;

pub fn print_separator<W: Write + ?Sized>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", "=".repeat(SEPARATOR_WIDTH))
}

pub fn print_header<W: Write + ?Sized>(out: &mut W, name: &str) -> io::Result<()> {
    print_separator(out)?;
    writeln!(out, "Contract: {name}")?;
    print_separator(out)
}

/// Prints the address in its network-appropriate friendly form together
/// with an explorer link.
pub fn print_address<W: Write + ?Sized>(
    out: &mut W,
    address: &Address,
    testnet: bool,
) -> io::Result<()> {
    let friendly = address.to_friendly(FriendlyFormat::for_network(testnet));
    writeln!(out, "Address: {friendly}")?;
    writeln!(out, "Explorer: {}{friendly}", explorer_base(testnet))?;
    print_separator(out)
}

#[must_use]
pub const fn explorer_base(testnet: bool) -> &'static str {
    if testnet {
        "https://testnet.tonapi.io/account/"
    } else {
        "https://tonapi.io/account/"
    }
}
