// SPDX-License-Identifier: GPL-3.0-or-later

use bitboard::*;
use position::Position;
use types::*;

use std;

macro_rules! V { ($x:expr) => (Value($x)) }
macro_rules! S { ($x:expr, $y:expr) => (Score(($y << 16) + $x)) }

const V0: Value = Value::ZERO;

// Pawn penalties
const BACKWARD: Score = S!(9, 22);
const DOUBLED: Score = S!(13, 51);
const ISOLATED: Score = S!(3, 15);
const WEAK_LEVER: Score = S!(4, 58);
const WEAK_UNOPPOSED: Score = S!(13, 24);

// Bonus for blocked pawns at 5th or 6th rank
const BLOCKED_PAWN: [Score; 2] = [S!(-17, -6), S!(-12, 2)];

const BLOCKED_STORM: [Score; 8] = [
    S!(0, 0), S!(0, 0), S!(75, 78), S!(-8, 16), S!(-6, 10), S!(-6, 7),
    S!(0, 2), S!(0, 0)
];

// Connected pawn bonus seed by rank
const CONNECTED: [i32; 8] = [0, 7, 8, 12, 29, 48, 86, 0];

// Strength of pawn shelter for our king by [distance from edge][rank].
// RANK_1 = 0 is used for files where we have no pawn, or where our pawn
// is behind our king.
const SHELTER_STRENGTH: [[Value; 8]; 4] = [
    [ V!( -5), V!( 82), V!( 92), V!( 54), V!( 36), V!( 22), V!(  28), V0 ],
    [ V!(-44), V!( 63), V!( 33), V!(-50), V!(-30), V!(-12), V!( -62), V0 ],
    [ V!(-11), V!( 77), V!( 22), V!( -6), V!( 31), V!(  8), V!( -45), V0 ],
    [ V!(-39), V!(-12), V!(-29), V!(-50), V!(-43), V!(-68), V!(-164), V0 ],
];

// Danger of enemy pawns moving toward our king by [distance from edge]
// [rank]. RANK_1 = 0 is used for files where the enemy has no pawn, or
// where their pawn is behind our king.
const UNBLOCKED_STORM: [[Value; 8]; 4] = [
    [ V!( 87), V!(-288), V!(-168), V!( 96), V!( 47), V!( 44), V!( 46), V0 ],
    [ V!( 42), V!( -25), V!( 120), V!( 45), V!( 34), V!( -9), V!( 24), V0 ],
    [ V!( -8), V!(  51), V!( 167), V!( 35), V!( -4), V!(-16), V!(-12), V0 ],
    [ V!(-17), V!( -13), V!( 100), V!(  4), V!(  9), V!(-16), V!(-31), V0 ],
];

// pawns::Entry contains various information about a pawn structure. A lookup
// in the pawn hash table (performed by calling the probing function) returns
// a pointer to an Entry object.

pub struct Entry {
    key: Key,
    scores: [Score; 2],
    passed_pawns: [Bitboard; 2],
    pawn_attacks: [Bitboard; 2],
    pawn_attacks_span: [Bitboard; 2],
    king_squares: [Square; 2],
    king_safety: [Score; 2],
    castling_rights: [CastlingRight; 2],
    blocked_count: i32,
}

impl Entry {
    pub fn new() -> Entry {
        Entry {
            key: Key(0),
            scores: [Score::ZERO; 2],
            passed_pawns: [Bitboard(0); 2],
            pawn_attacks: [Bitboard(0); 2],
            pawn_attacks_span: [Bitboard(0); 2],
            king_squares: [Square::NONE; 2],
            king_safety: [Score::ZERO; 2],
            castling_rights: [CastlingRight(0); 2],
            blocked_count: 0,
        }
    }

    pub fn pawn_score(&self, c: Color) -> Score {
        self.scores[c.0 as usize]
    }

    pub fn pawn_attacks(&self, c: Color) -> Bitboard {
        self.pawn_attacks[c.0 as usize]
    }

    pub fn passed_pawns(&self, c: Color) -> Bitboard {
        self.passed_pawns[c.0 as usize]
    }

    pub fn pawn_attacks_span(&self, c: Color) -> Bitboard {
        self.pawn_attacks_span[c.0 as usize]
    }

    pub fn passed_count(&self) -> u32 {
        popcount(self.passed_pawns[WHITE.0 as usize]
            | self.passed_pawns[BLACK.0 as usize])
    }

    pub fn blocked_count(&self) -> i32 {
        self.blocked_count
    }

    pub fn king_safety<C: ColorTrait>(&mut self, pos: &Position) -> Score {
        let us = C::COLOR;
        if self.king_squares[us.0 as usize] != pos.square(us, KING)
            || self.castling_rights[us.0 as usize] != pos.castling_rights(us)
        {
            self.king_safety[us.0 as usize] = self.do_king_safety::<C>(pos);
        }
        self.king_safety[us.0 as usize]
    }

    // evaluate_shelter() calculates the shelter bonus and the storm penalty
    // for a king, by looking at the king file and the two closest files.

    fn evaluate_shelter<C: ColorTrait>(
        &self, pos: &Position, ksq: Square
    ) -> Score {
        let us = C::COLOR;
        let them = if us == WHITE { BLACK } else { WHITE };

        let b = pos.pieces_p(PAWN) & !forward_ranks_bb(them, ksq);
        let our_pawns =
            b & pos.pieces_c(us) & !self.pawn_attacks[them.0 as usize];
        let their_pawns = b & pos.pieces_c(them);

        let mut bonus = Score::make(5, 5);

        let center = std::cmp::max(FILE_B, std::cmp::min(FILE_G, ksq.file()));
        for f in (center - 1)..(center + 2) {
            let b = our_pawns & file_bb(f);
            let our_rank = if b != 0 {
                frontmost_sq(them, b).relative_rank(us)
            } else {
                RANK_1
            };

            let b = their_pawns & file_bb(f);
            let their_rank = if b != 0 {
                frontmost_sq(them, b).relative_rank(us)
            } else {
                RANK_1
            };

            let d = edge_distance(f) as usize;
            bonus += Score::make(
                SHELTER_STRENGTH[d][our_rank as usize].0, 0);

            if our_rank != RANK_1 && our_rank + 1 == their_rank {
                bonus -= BLOCKED_STORM[their_rank as usize];
            } else {
                bonus -= Score::make(
                    UNBLOCKED_STORM[d][their_rank as usize].0, 0);
            }
        }

        bonus
    }

    // do_king_safety() calculates a bonus for king safety. It is called
    // only when the king square or the castling rights change.

    fn do_king_safety<C: ColorTrait>(&mut self, pos: &Position) -> Score {
        let us = C::COLOR;
        let ksq = pos.square(us, KING);
        self.king_squares[us.0 as usize] = ksq;
        self.castling_rights[us.0 as usize] = pos.castling_rights(us);

        // Compare by the middlegame value only
        let mut shelter = self.evaluate_shelter::<C>(pos, ksq);

        // If we can castle use the bonus after castling if it is bigger
        if pos.has_castling_right(us | CastlingSide::KING) {
            let s = self.evaluate_shelter::<C>(pos, Square::G1.relative(us));
            if s.mg() > shelter.mg() {
                shelter = s;
            }
        }

        if pos.has_castling_right(us | CastlingSide::QUEEN) {
            let s = self.evaluate_shelter::<C>(pos, Square::C1.relative(us));
            if s.mg() > shelter.mg() {
                shelter = s;
            }
        }

        // In endgame we like to bring our king near our closest pawn
        let pawns = pos.pieces_cp(us, PAWN);
        let mut min_pawn_dist = 6;

        if pawns & pseudo_attacks(KING, ksq) != 0 {
            min_pawn_dist = 1;
        } else {
            for s in pawns {
                min_pawn_dist =
                    std::cmp::min(min_pawn_dist, Square::distance(ksq, s));
            }
        }

        shelter - Score::make(0, 16 * min_pawn_dist as i32)
    }
}

// pawns::probe() looks up the current position's pawn configuration in the
// pawn hash table. If it is not found, it is computed and stored in the table.

pub fn probe(pos: &Position) -> &mut Entry {
    let key = pos.pawn_key();
    let e = pos.pawns_table[(key.0 & 16383) as usize].get();
    let e: &'static mut Entry = unsafe { &mut *e };

    if e.key == key {
        return e;
    }

    e.key = key;
    e.blocked_count = 0;
    e.scores[WHITE.0 as usize] = evaluate::<White>(pos, e);
    e.scores[BLACK.0 as usize] = evaluate::<Black>(pos, e);

    e
}

fn evaluate<C: ColorTrait>(pos: &Position, e: &mut Entry) -> Score {
    let us = C::COLOR;
    let them = if us == WHITE { BLACK } else { WHITE };
    let up = if us == WHITE { NORTH } else { SOUTH };

    let mut score = Score::ZERO;

    let our_pawns = pos.pieces_cp(us, PAWN);
    let their_pawns = pos.pieces_cp(them, PAWN);

    let double_attack_them = pawn_double_attacks_bb(them, their_pawns);

    e.passed_pawns[us.0 as usize] = Bitboard(0);
    e.king_squares[us.0 as usize] = Square::NONE;
    e.pawn_attacks[us.0 as usize] = pawn_attacks_bb(us, our_pawns);
    e.pawn_attacks_span[us.0 as usize] = e.pawn_attacks[us.0 as usize];
    e.blocked_count += popcount(
        our_pawns.shift(up) & (their_pawns | double_attack_them)) as i32;

    // Loop through all pawns of the current color and score each pawn
    for s in pos.square_list(us, PAWN) {
        debug_assert!(pos.piece_on(s) == Piece::make(us, PAWN));

        let f = s.file();
        let r = s.relative_rank(us);

        // Flag the pawn
        let opposed    = their_pawns & forward_file_bb(us, s);
        let blocked    = their_pawns & (s + up);
        let stoppers   = their_pawns & passed_pawn_mask(us, s);
        let lever      = their_pawns & pawn_attacks(us, s);
        let lever_push = their_pawns & pawn_attacks(us, s + up);
        let doubled    = our_pawns & (s - up);
        let neighbours = our_pawns & adjacent_files_bb(f);
        let phalanx    = neighbours & rank_bb(s.rank());
        let support    = neighbours & rank_bb((s - up).rank());

        // A pawn is backward when it is behind all pawns of the same color
        // on the adjacent files and cannot safely advance.
        let backward = neighbours & forward_ranks_bb(them, s + up) == 0
            && (lever_push | blocked) != 0;

        // Compute additional span if pawn is not backward nor blocked
        if !backward && blocked == 0 {
            e.pawn_attacks_span[us.0 as usize] |= pawn_attack_span(us, s);
        }

        // A pawn is passed if one of the three following conditions is true:
        // (a) there are no stoppers except some levers
        // (b) the only stoppers are the lever_push, but we outnumber them
        // (c) there is only one front stopper which can be levered
        let passed = (stoppers ^ lever == 0
                || (stoppers ^ lever_push == 0
                    && popcount(phalanx) >= popcount(lever_push))
                || (stoppers == blocked && r >= RANK_5
                    && support.shift(up)
                        & !(their_pawns | double_attack_them) != 0))
            && our_pawns & forward_file_bb(us, s) == 0;

        // Passed pawns will be properly scored later in evaluation when we
        // have full attack info.
        if passed {
            e.passed_pawns[us.0 as usize] |= s;
        }

        // Score this pawn
        if support | phalanx != 0 {
            let v = CONNECTED[r as usize]
                    * (2 + (phalanx != 0) as i32 - (opposed != 0) as i32)
                + 21 * popcount(support) as i32;
            score += Score::make(v, v * (r as i32 - 2) / 4);
        } else if neighbours == 0 {
            if opposed != 0
                && our_pawns & forward_file_bb(them, s) != 0
                && their_pawns & adjacent_files_bb(f) == 0
            {
                score -= DOUBLED;
            } else {
                score -= ISOLATED;
                if opposed == 0 {
                    score -= WEAK_UNOPPOSED;
                }
            }
        } else if backward {
            score -= BACKWARD;
            if opposed == 0 && !(FILEA_BB | FILEH_BB) & s != 0 {
                score -= WEAK_UNOPPOSED;
            }
        }

        if support == 0 {
            if doubled != 0 {
                score -= DOUBLED;
            }
            if more_than_one(lever) {
                score -= WEAK_LEVER;
            }
        }

        if blocked != 0 && r >= RANK_5 {
            score += BLOCKED_PAWN[(r - RANK_5) as usize];
        }
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_position(fen: &str) -> Position {
        ::init_for_tests();
        let mut pos = Position::new();
        pos.init_states();
        pos.alloc_caches();
        pos.set(fen, false);
        pos
    }

    #[test]
    fn start_position_is_symmetric() {
        let pos = make_position(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        let e = probe(&pos);
        assert_eq!(e.pawn_score(WHITE), e.pawn_score(BLACK));
        assert_eq!(e.passed_count(), 0);
        assert_eq!(e.blocked_count(), 0);
    }

    #[test]
    fn lone_pawn_is_passed_and_isolated() {
        let pos = make_position("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");
        let e = probe(&pos);
        assert_eq!(e.passed_pawns(WHITE), Square::E2.bb());
        assert_eq!(e.passed_pawns(BLACK), Bitboard(0));
        assert!(e.pawn_score(WHITE).mg() < Value::ZERO);
    }

    #[test]
    fn king_safety_is_cached_per_king_square() {
        let pos = make_position(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        let e = probe(&pos);
        let first = e.king_safety::<White>(&pos);
        assert_eq!(e.king_safety::<White>(&pos), first);
        // Both sides shelter equally in the symmetric start position
        assert_eq!(e.king_safety::<Black>(&pos), first);
    }

    #[test]
    fn facing_pawns_block_each_other() {
        let pos = make_position("4k3/8/8/3p4/3P4/8/8/4K3 w - - 0 1");
        let e = probe(&pos);
        assert_eq!(e.passed_count(), 0);
        assert_eq!(e.blocked_count(), 2);
    }
}
