//! The scratch registers handed out to code generation.

use std::fmt;

use crate::result::{BackendError, BackendResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register(u8);

impl Register {
    /// Always zero.
    pub const ZERO: Register = Register(0);
    /// Where `getint` leaves the integer it read.
    pub const INPUT: Register = Register(1);
    /// Where library routines leave their result.
    pub const RESULT: Register = Register(13);
    /// Stack pointer used by library routines.
    pub const STACK: Register = Register(14);
    /// Return address of `jl`.
    pub const LINK: Register = Register(15);

    /// The first register the pool manages.
    const FIRST: u8 = 1;
    /// The last register the pool manages.
    const LAST: u8 = 12;

    pub fn number(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Hands out `r1`-`r12`, lowest first.
#[derive(Debug, Clone)]
pub struct RegisterPool {
    claimed: [bool; Register::LAST as usize + 1],
    ever_claimed: [bool; Register::LAST as usize + 1],
}

impl Default for RegisterPool {
    fn default() -> Self {
        RegisterPool {
            claimed: [false; Register::LAST as usize + 1],
            ever_claimed: [false; Register::LAST as usize + 1],
        }
    }
}

impl RegisterPool {
    pub fn claim(&mut self) -> BackendResult<Register> {
        let free = (Register::FIRST..=Register::LAST).find(|n| !self.claimed[*n as usize]);
        let Some(n) = free else {
            return Err(BackendError::RegistersExhausted);
        };
        self.claimed[n as usize] = true;
        self.ever_claimed[n as usize] = true;
        Ok(Register(n))
    }

    pub fn free(&mut self, register: Register) -> BackendResult {
        let n = register.0;
        if !(Register::FIRST..=Register::LAST).contains(&n) || !self.ever_claimed[n as usize] {
            return Err(BackendError::RegisterNotClaimed(register));
        }
        if !self.claimed[n as usize] {
            return Err(BackendError::RegisterDoubleFree(register));
        }
        self.claimed[n as usize] = false;
        Ok(())
    }

    pub fn claimed(&self) -> Vec<Register> {
        (Register::FIRST..=Register::LAST).filter(|n| self.claimed[*n as usize]).map(Register).collect()
    }

    /// Fails with the registers still claimed, if any.
    pub fn check_all_free(&self) -> BackendResult {
        let claimed = self.claimed();
        if claimed.is_empty() {
            return Ok(());
        }
        let names: Vec<String> = claimed.iter().map(ToString::to_string).collect();
        Err(BackendError::RegistersLeaked(names.join(", ")))
    }
}
