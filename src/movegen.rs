// SPDX-License-Identifier: GPL-3.0-or-later

use types::*;
use bitboard::*;
use position::Position;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum GenType {
    Captures,
    Quiets,
    Evasions,
    NonEvasions,
    Legal,
}

use movegen::GenType::*;

#[derive(Clone, Copy)]
pub struct ExtMove {
    pub m: Move,
    pub value: i32,
}

// The MoveList struct is a simple wrapper around generate_*(). It sometimes
// comes in handy to use this struct instead of the low-level generate_*()
// functions.
pub struct MoveList {
    list: [ExtMove; MAX_MOVES],
    idx: usize,
    num: usize,
}

impl MoveList {
    pub fn new(pos: &Position, gen_type: GenType) -> MoveList {
        let mut moves = MoveList {
            list: [ExtMove { m : Move::NONE, value: 0 }; MAX_MOVES],
            idx: 0,
            num: 0,
        };
        { // we need to borrow "moves"
            let mut list: &mut [ExtMove] = &mut moves.list;
            moves.num = match gen_type {
                Captures => generate_captures(pos, &mut list, 0),
                Quiets => generate_quiets(pos, &mut list, 0),
                Evasions => generate_evasions(pos, &mut list, 0),
                NonEvasions => generate_non_evasions(pos, &mut list, 0),
                Legal => generate_legal(pos, &mut list, 0),
            };
            moves.idx = 0;
        } // borrow ends here, so we can move out "moves"
        moves
    }

    pub fn size(&self) -> usize {
        self.num
    }

    pub fn contains(&self, m: Move) -> bool {
        let mut i = 0;
        while i < self.num {
            if self.list[i].m == m {
                return true;
            }
            i += 1;
        }
        return false
    }
}

impl Iterator for MoveList {
    type Item = Move;
    fn next(&mut self) -> Option<Self::Item> {
        if self.idx == self.num {
            None
        } else {
            self.idx += 1;
            Some(self.list[self.idx - 1].m)
        }
    }
}

fn generate_castling(
    pos: &Position, list: &mut [ExtMove], idx: usize, us: Color,
    cr: CastlingRight, chess960: bool
) -> usize {
    let king_side = cr == WHITE_OO || cr == BLACK_OO;

    if pos.castling_impeded(cr) || !pos.has_castling_right(cr) {
        return idx;
    }

    // After castling, the rook and king final positions are the same in
    // Chess960 as they are in standard chess.
    let kfrom = pos.square(us, KING);
    let rfrom = pos.castling_rook_square(cr);
    let kto =
        relative_square(us, if king_side { Square::G1 } else { Square::C1 });
    let enemies = pos.pieces_c(!us);

    debug_assert!(pos.checkers() == 0);

    let direction = match chess960 {
        true  => if kto > kfrom { WEST } else { EAST },
        false => if king_side { WEST } else { EAST },
    };

    let mut s = kto;
    while s != kfrom {
        if pos.attackers_to(s) & enemies != 0 {
            return idx;
        }
        s += direction;
    }

    // Because we generate only legal castling moves, we need to verify that
    // when moving the castling rook we do not discover some hidden checker.
    // For instance an enemy queen on A1 when the castling rook is on B1.
    if chess960
        && attacks_bb(ROOK, kto, pos.pieces() ^ rfrom)
            & pos.pieces_cpp(!us, ROOK, QUEEN) != 0
    {
        return idx;
    }

    list[idx].m = Move::make_special(CASTLING, kfrom, rfrom);
    idx + 1
}

fn add_promotions(
    list: &mut [ExtMove], mut idx: usize, to: Square,
    gen_type: GenType, direction: Direction
) -> usize {
    if gen_type == Captures || gen_type == Evasions || gen_type == NonEvasions {
        list[idx].m = Move::make_prom(to - direction, to, QUEEN);
        idx += 1;
    }

    if gen_type == Quiets || gen_type == Evasions || gen_type == NonEvasions {
        list[idx    ].m = Move::make_prom(to - direction, to, ROOK);
        list[idx + 1].m = Move::make_prom(to - direction, to, BISHOP);
        list[idx + 2].m = Move::make_prom(to - direction, to, KNIGHT);
        idx += 3;
    }

    idx
}

fn generate_pawn_moves(
    pos: &Position, list: &mut [ExtMove], mut idx: usize, target: Bitboard,
    us: Color, gen_type: GenType
) -> usize {
    let them = !us;
    let trank_8bb = if us == WHITE { RANK8_BB } else { RANK1_BB };
    let trank_7bb = if us == WHITE { RANK7_BB } else { RANK2_BB };
    let trank_3bb = if us == WHITE { RANK3_BB } else { RANK6_BB };
    let up    = if us == WHITE { NORTH      } else { SOUTH      };
    let right = if us == WHITE { NORTH_EAST } else { SOUTH_WEST };
    let left  = if us == WHITE { NORTH_WEST } else { SOUTH_EAST };

    let mut empty_squares = Bitboard(0);

    let pawns_on_7     = pos.pieces_cp(us, PAWN) &  trank_7bb; 
    let pawns_not_on_7 = pos.pieces_cp(us, PAWN) & !trank_7bb;

    let enemies = match gen_type {
        Evasions => pos.pieces_c(them) & target,
        Captures => target,
        _        => pos.pieces_c(them)
    };

    // Single and double pawn pushes, no promotions
    if gen_type != Captures {
        empty_squares =
            if gen_type == Quiets { target } else { !pos.pieces() };

        let mut b1 = pawns_not_on_7.shift(up) & empty_squares;
        let mut b2 = (b1 & trank_3bb).shift(up) & empty_squares;

        if gen_type == Evasions { // Consider only blocking squares
            b1 &= target;
            b2 &= target;
        }

        for to in b1 {
            list[idx].m = Move::make(to - up, to);
            idx += 1;
        }

        for to in b2 {
            list[idx].m = Move::make(to - up - up, to);
            idx += 1;
        }
    }

    // Promotions and underpromotions
    if pawns_on_7 != 0 && (gen_type != Evasions || target & trank_8bb != 0) {
        if gen_type == Captures {
            empty_squares = !pos.pieces();
        }

        if gen_type == Evasions {
            empty_squares &= target;
        }

        let b1 = pawns_on_7.shift(right) & enemies;
        let b2 = pawns_on_7.shift(left ) & enemies;
        let b3 = pawns_on_7.shift(up   ) & empty_squares;

        for s in b1 {
            idx = add_promotions(list, idx, s, gen_type, right);
        }

        for s in b2 {
            idx = add_promotions(list, idx, s, gen_type, left);
        }

        for s in b3 {
            idx = add_promotions(list, idx, s, gen_type, up);
        }
    }

    // Standard and en-passant captures
    if gen_type == Captures || gen_type == Evasions || gen_type == NonEvasions {
        let b1 = pawns_not_on_7.shift(right) & enemies;
        let b2 = pawns_not_on_7.shift(left ) & enemies;

        for to in b1 {
            list[idx].m = Move::make(to - right, to);
            idx += 1;
        }

        for to in b2 {
            list[idx].m = Move::make(to - left, to);
            idx += 1;
        }

        if pos.ep_square() != Square::NONE {
            debug_assert!(pos.ep_square().rank() == relative_rank(us, RANK_6));

            // An en passant capture can be an evasion only if the checking
            // piece is the double pushed pawn and so is in the target.
            // Otherwise this is a discovery check and we are forced to do
            // otherwise.
            if gen_type == Evasions && target & (pos.ep_square() - up) == 0 {
                return idx;
            }

            let b1 =
                pawns_not_on_7 & pos.attacks_from_pawn(pos.ep_square(), them);

            debug_assert!(b1 != 0);

            for to in b1 {
                list[idx].m =
                    Move::make_special(ENPASSANT, to, pos.ep_square());
                idx += 1;
            }
        }
    }

    idx
}

fn generate_moves(
    pos: &Position, list: &mut [ExtMove], mut idx: usize, us: Color,
    target: Bitboard, pt: PieceType
) -> usize {
    debug_assert!(pt != KING && pt != PAWN);

    for from in pos.square_list(us, pt) {
        let b = pos.attacks_from(pt, from) & target;

        for to in b {
            list[idx].m = Move::make(from, to);
            idx += 1;
        }
    }

    idx
}

fn generate_all(
    pos: &Position, list: &mut [ExtMove], mut idx: usize, target: Bitboard,
    us: Color, gen_type: GenType
) -> usize {
    idx = generate_pawn_moves(pos, list, idx, target, us, gen_type);
    idx = generate_moves(pos, list, idx, us, target, KNIGHT);
    idx = generate_moves(pos, list, idx, us, target, BISHOP);
    idx = generate_moves(pos, list, idx, us, target, ROOK  );
    idx = generate_moves(pos, list, idx, us, target, QUEEN );

    if gen_type != Evasions {
        let ksq = pos.square(us, KING);
        let b = pos.attacks_from(KING, ksq) & target;
        for to in b {
            list[idx].m = Move::make(ksq, to);
            idx += 1;
        }
    }

    if gen_type != Captures && gen_type != Evasions && pos.can_castle(us) {
        if pos.is_chess960() {
            idx = generate_castling(pos, list, idx, us,
                CastlingRight::make(us, CastlingSide::KING), true);
            idx = generate_castling(pos, list, idx, us,
                CastlingRight::make(us, CastlingSide::QUEEN), true);
        } else {
            idx = generate_castling(pos, list, idx, us,
                CastlingRight::make(us, CastlingSide::KING), false);
            idx = generate_castling(pos, list, idx, us,
                CastlingRight::make(us, CastlingSide::QUEEN), false);
        }
    }

    idx
}

fn generate(
    pos: &Position, list: &mut [ExtMove], idx: usize, gen_type: GenType
) -> usize {
    debug_assert!(
        gen_type == Captures || gen_type == Quiets || gen_type == NonEvasions
    );
    debug_assert!(pos.checkers() == 0);

    let us = pos.side_to_move();

    let target = match gen_type {
        Captures    => pos.pieces_c(!us),
        Quiets      => !pos.pieces(),
        NonEvasions => !pos.pieces_c(us),
        _           => Bitboard(0)
    };

    if us == WHITE {
        generate_all(pos, list, idx, target, WHITE, gen_type)
    } else {
        generate_all(pos, list, idx, target, BLACK, gen_type)
    }
}

// generate_captures() generates all pseudo-legal captures and queen
// promotions
pub fn generate_captures(
    pos: &Position, list: &mut [ExtMove], idx: usize
) -> usize {
    generate(pos, list, idx, Captures)
}

// generate_quiets() generates all pseudo-legal non-captures and
// underpromotions.
pub fn generate_quiets(
    pos: &Position, list: &mut [ExtMove], idx: usize
) -> usize {
    generate(pos, list, idx, Quiets)
}

// generate_non_evasions() generates all pseudo-legal captures and
// non-captures
pub fn generate_non_evasions(
    pos: &Position, list: &mut [ExtMove], idx: usize
) -> usize {
    generate(pos, list, idx, NonEvasions)
}

// generate_evasions() generates all pseudo-legal check evasions when the
// side to move is in check
pub fn generate_evasions(
    pos: &Position, list: &mut [ExtMove], mut idx: usize
) -> usize {
    debug_assert!(pos.checkers() != 0);

    let us = pos.side_to_move();
    let ksq = pos.square(us, KING);
    let mut slider_attacks = Bitboard(0);
    let sliders = pos.checkers() & !pos.pieces_pp(KNIGHT, PAWN);

    // Find all the squares attacked by slider checks. We will remove them
    // from the king evasions in order to skip known illegal moves, which
    // avoids any useless legality checks later on.
    for check_sq in sliders {
        slider_attacks |= line_bb(check_sq, ksq) ^ check_sq;
    }

    // Generate evasions for king, capture and non-capture moves
    let b = pos.attacks_from(KING, ksq) & !pos.pieces_c(us) & !slider_attacks;
    for to in b {
        list[idx].m = Move::make(ksq, to);
        idx += 1;
    }

    if more_than_one(pos.checkers()) {
        return idx; // Double check, only a king move can save the day
    }

    // Generate blocking evasions or captures of the checking piece
    let check_sq = lsb(pos.checkers());
    let target = between_bb(check_sq, ksq) | check_sq;

    if us == WHITE {
        generate_all(pos, list, idx, target, WHITE, Evasions)
    } else {
        generate_all(pos, list, idx, target, BLACK, Evasions)
    }
}

// generate_legal() generates all the legal moves in the given position
pub fn generate_legal(
    pos: &Position, list: &mut [ExtMove], idx: usize
) -> usize {
    let pinned = pos.pinned_pieces(pos.side_to_move()) != 0;
    let ksq = pos.square(pos.side_to_move(), KING);

    let pseudo = if pos.checkers() != 0 {
        generate_evasions(pos, list, idx)
    } else {
        generate_non_evasions(pos, list, idx)
    };

    let mut legal = idx;
    for i in idx..pseudo {
        let m = list[i].m;
        if (!pinned && m.from() != ksq && m.move_type() != ENPASSANT)
            || pos.legal(m)
        {
            list[legal].m = m;
            legal += 1;
        }
    }

    legal
}

#[cfg(test)]
mod tests {
    use super::*;
    use position::Position;

    fn perft(pos: &mut Position, depth: i32) -> u64 {
        let leaf = depth == 2;
        let mut nodes = 0;
        let moves: Vec<Move> = MoveList::new(pos, GenType::Legal).collect();
        for m in moves {
            if depth <= 1 {
                nodes += 1;
            } else {
                let gives_check = pos.gives_check(m);
                pos.do_move(m, gives_check);
                nodes += if leaf {
                    MoveList::new(pos, GenType::Legal).size() as u64
                } else {
                    perft(pos, depth - 1)
                };
                pos.undo_move(m);
            }
        }
        nodes
    }

    fn make_position(fen: &str) -> Position {
        ::init_for_tests();
        let mut pos = Position::new();
        pos.init_states();
        pos.set(fen, false);
        pos
    }

    #[test]
    fn perft_start_position() {
        let mut pos = make_position(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert_eq!(perft(&mut pos, 1), 20);
        assert_eq!(perft(&mut pos, 2), 400);
        assert_eq!(perft(&mut pos, 3), 8902);
        assert_eq!(perft(&mut pos, 4), 197281);
    }

    #[test]
    fn perft_kiwipete() {
        let mut pos = make_position(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        assert_eq!(perft(&mut pos, 1), 48);
        assert_eq!(perft(&mut pos, 2), 2039);
        assert_eq!(perft(&mut pos, 3), 97862);
    }

    #[test]
    fn no_legal_moves_when_mated() {
        let pos = make_position(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        assert!(pos.checkers() != 0);
        assert_eq!(MoveList::new(&pos, GenType::Legal).size(), 0);
    }

    #[test]
    fn check_evasions_include_blocks_and_interpositions() {
        let pos = make_position(
            "rnbqkbnr/ppp1pppp/8/1B1p4/4P3/8/PPPP1PPP/RNBQK1NR b KQkq - 1 2");
        assert!(pos.checkers() != 0);
        assert_eq!(MoveList::new(&pos, GenType::Legal).size(), 5);
    }
}
