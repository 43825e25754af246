//! umask - Display or set the file creation mask
//!
//! umask [-S] [mode]
//!
//! Without a mode prints the mask in octal, or with `-S` the permissions
//! it leaves allowed (`u=rwx,g=rx,o=rx`). The mode is an octal number or
//! a symbolic list such as `u=rwx,go-w`.

use crate::interpreter::helpers::result::BuiltinResult;

const WHO_BITS: [(char, u32); 3] = [('u', 0o700), ('g', 0o070), ('o', 0o007)];
const PERM_BITS: [(char, u32); 3] = [('r', 0o444), ('w', 0o222), ('x', 0o111)];

fn current_mask() -> u32 {
    // SAFETY: umask cannot fail; the original mask is put straight back
    let mask = unsafe {
        let mask = libc::umask(0);
        libc::umask(mask);
        mask
    };
    u32::from(mask) & 0o777
}

fn set_mask(mask: u32) {
    // SAFETY: umask cannot fail
    unsafe { libc::umask((mask & 0o777) as libc::mode_t) };
}

/// `u=rwx,g=rx,o=` form of the permissions a mask allows
fn symbolic(mask: u32) -> String {
    let allowed = !mask & 0o777;
    WHO_BITS
        .iter()
        .map(|(who, who_bits)| {
            let perms: String = PERM_BITS
                .iter()
                .filter(|(_, perm_bits)| allowed & who_bits & perm_bits != 0)
                .map(|(perm, _)| *perm)
                .collect();
            format!("{}={}", who, perms)
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Apply a symbolic mode such as `u=rwx,go-w` to `mask`
fn apply_symbolic(mask: u32, mode: &str) -> Option<u32> {
    let mut allowed = !mask & 0o777;
    for clause in mode.split(',') {
        let op_at = clause.find(|c| matches!(c, '=' | '+' | '-'))?;
        let (who, rest) = clause.split_at(op_at);
        let mut who_mask = 0;
        for c in who.chars() {
            who_mask |= match c {
                'a' => 0o777,
                _ => WHO_BITS.iter().find(|(w, _)| *w == c)?.1,
            };
        }
        if who.is_empty() {
            who_mask = 0o777;
        }

        let mut chars = rest.chars();
        let op = chars.next()?;
        let mut perm_mask = 0;
        for c in chars {
            perm_mask |= PERM_BITS.iter().find(|(p, _)| *p == c)?.1;
        }
        let bits = who_mask & perm_mask;
        match op {
            '=' => allowed = (allowed & !who_mask) | bits,
            '+' => allowed |= bits,
            _ => allowed &= !bits,
        }
    }
    Some(!allowed & 0o777)
}

fn parse_mode(mask: u32, mode: &str) -> Option<u32> {
    if mode.starts_with(|c: char| c.is_ascii_digit()) {
        return u32::from_str_radix(mode, 8).ok().filter(|m| *m <= 0o777);
    }
    apply_symbolic(mask, mode)
}

pub fn handle_umask(args: &[String]) -> BuiltinResult {
    let mut symbolic_output = false;
    let mut operands = args;
    while let Some(first) = operands.first() {
        match first.as_str() {
            "-S" => symbolic_output = true,
            "--" => {
                operands = &operands[1..];
                break;
            }
            _ => break,
        }
        operands = &operands[1..];
    }

    let mask = current_mask();
    let Some(mode) = operands.first() else {
        return BuiltinResult::success(if symbolic_output {
            format!("{}\n", symbolic(mask))
        } else {
            format!("{:04o}\n", mask)
        });
    };

    match parse_mode(mask, mode) {
        Some(new_mask) => {
            tracing::debug!(mask = format_args!("{:04o}", new_mask), "umask set");
            set_mask(new_mask);
            BuiltinResult::ok()
        }
        None => BuiltinResult::failure(format!("posish: umask: {}: invalid mode\n", mode), 1),
    }
}
