use std::net::SocketAddr;

use rand::{Rng, thread_rng};

use crate::state::{Registration, ServerState};

/// No 0/O, 1/I/L: ids end up in logs people read back.
const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

pub const ID_LEN: usize = 6;

const ATTEMPTS_PER_LEN: usize = 16;

pub fn make_id(len: usize) -> String {
    let mut rng = thread_rng();

    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Registers `peer` under a fresh random id, growing the id after repeated collisions.
pub fn register(state: &ServerState, peer: SocketAddr) -> Registration {
    let mut len = ID_LEN;

    loop {
        for _ in 0..ATTEMPTS_PER_LEN {
            if let Some(reg) = state.try_register(make_id(len), peer) {
                return reg;
            }
        }

        len += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_use_the_unambiguous_alphabet() {
        let id = make_id(32);

        assert_eq!(id.len(), 32);
        assert!(id.bytes().all(|b| ALPHABET.contains(&b)));
        assert!(!id.contains('O') && !id.contains('0') && !id.contains('I'));
    }

    #[test]
    fn concurrent_registrations_never_share_an_id() {
        let state = ServerState::default();
        let peer: SocketAddr = "127.0.0.1:1".parse().unwrap();

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let state = state.clone();
                std::thread::spawn(move || {
                    (0..64).map(|_| register(&state, peer)).collect::<Vec<_>>()
                })
            })
            .collect();

        let regs: Vec<_> = workers
            .into_iter()
            .flat_map(|w| w.join().unwrap())
            .collect();
        assert_eq!(regs.len(), 512);
        assert_eq!(state.len(), 512);

        drop(regs);
        assert!(state.is_empty());
    }
}
