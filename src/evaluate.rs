// SPDX-License-Identifier: GPL-3.0-or-later

use bitboard::*;
use context::EvalContext;
use material;
use nnue;
use pawns;
use position::Position;
use types::*;

use std;

// Evaluation struct contains various information computed and collected by
// the evaluation functions.
struct EvalInfo<'a> {
    me: &'a material::Entry,
    pe: &'a mut pawns::Entry,
    mobility_area: [Bitboard; 2],
    mobility: [Score; 2],

    // attacked_by[Color][PieceType] is a bitboard representing all squares
    // attacked by a given color and piece type. The "piece type" ALL_PIECES
    // is also calculated.
    attacked_by: [[Bitboard; 8]; 2],

    // attacked_by2[Color] are the squares attacked by at least 2 units of a
    // given color, including x-rays. But diagonal x-rays through pawns are
    // not computed.
    attacked_by2: [Bitboard; 2],

    // king_ring[Color] is the zone around our king which is considered by
    // the king safety evaluation. It is a square-centered 3x3 area,
    // adjusted to stay on the board when the king is close to an edge.
    king_ring: [Bitboard; 2],

    // king_attackers_count[Color] is the number of pieces of the given
    // color which attack a square in the king_ring of the enemy king.
    king_attackers_count: [i32; 2],

    // king_attackers_weight[Color] is the sum of the "weights" of the
    // pieces of the given color which attack a square in the king_ring of
    // the enemy king. The weights of the individual piece types are given
    // by the elements in the KING_ATTACK_WEIGHTS array.
    king_attackers_weight: [i32; 2],

    // king_attacks_count[Color] is the number of attacks by the given
    // color to squares directly adjacent to the enemy king. Pieces which
    // attack more than one square are counted multiple times.
    king_attacks_count: [i32; 2],
}

impl<'a> EvalInfo<'a> {
    fn new(me: &'a material::Entry, pe: &'a mut pawns::Entry) -> EvalInfo<'a> {
        EvalInfo {
            me: me,
            pe: pe,
            mobility_area: [Bitboard(0); 2],
            mobility: [Score::ZERO; 2],
            attacked_by: [[Bitboard(0); 8]; 2],
            attacked_by2: [Bitboard(0); 2],
            king_ring: [Bitboard(0); 2],
            king_attackers_count: [0; 2],
            king_attackers_weight: [0; 2],
            king_attacks_count: [0; 2],
        }
    }
}

macro_rules! S { ($x:expr, $y:expr) => (Score(($y << 16) + $x)) }

const S0: Score = Score::ZERO;

// MOBILITY_BONUS[PieceType-2][attacked] contains bonuses for middle and end
// game, indexed by piece type and number of attacked squares in the mobility
// area.
const MOBILITY_BONUS: [[Score; 32]; 4] = [
    // Knights
    [ S!(-62,-79), S!(-53,-57), S!(-12,-31), S!( -3,-17), S!(  3,  7),
      S!( 12, 13), S!( 21, 16), S!( 28, 21), S!( 37, 26), S0, S0, S0, S0, S0,
      S0, S0, S0, S0, S0, S0, S0, S0, S0, S0, S0, S0, S0, S0, S0, S0, S0, S0 ],
    // Bishops
    [ S!(-47,-59), S!(-20,-25), S!( 14, -8), S!( 29, 12), S!( 39, 21),
      S!( 53, 40), S!( 53, 56), S!( 60, 58), S!( 62, 65), S!( 69, 72),
      S!( 78, 78), S!( 83, 87), S!( 91, 88), S!( 96, 98), S0, S0, S0, S0, S0,
      S0, S0, S0, S0, S0, S0, S0, S0, S0, S0, S0, S0, S0 ],
    // Rooks
    [ S!(-60,-82), S!(-24,-15), S!(  0, 17), S!(  3, 43), S!(  4, 72),
      S!( 14,100), S!( 20,102), S!( 30,122), S!( 41,133), S!( 41,139),
      S!( 41,153), S!( 45,160), S!( 57,165), S!( 58,170), S!( 67,175), S0, S0,
      S0, S0, S0, S0, S0, S0, S0, S0, S0, S0, S0, S0, S0, S0, S0 ],
    // Queens
    [ S!(-29,-49), S!(-16,-29), S!( -8, -8), S!( -8, 17), S!( 18, 39),
      S!( 25, 54), S!( 23, 59), S!( 37, 73), S!( 41, 76), S!( 54, 95),
      S!( 65, 95), S!( 68,101), S!( 69,124), S!( 70,128), S!( 70,132),
      S!( 70,133), S!( 71,136), S!( 72,140), S!( 74,147), S!( 76,149),
      S!( 90,153), S!(104,169), S!(105,171), S!(106,171), S!(112,178),
      S!(114,185), S!(114,187), S!(119,221), S0, S0, S0, S0 ]
];

// KING_PROTECTOR[knight/bishop] contains a penalty according to the distance
// of a minor piece from our king.
const KING_PROTECTOR: [Score; 2] = [ S!(8, 9), S!(6, 9) ];

// ROOK_ON_FILE[semiopen/open] contains bonuses for each rook when there is
// no friendly pawn on the rook file.
const ROOK_ON_FILE: [Score; 2] = [ S!(19, 7), S!(48, 27) ];

// THREAT_BY_MINOR/BY_ROOK[attacked PieceType] contains bonuses according to
// which piece type attacks which one. Attacks on lesser pieces which are
// pawn-defended are not considered.
const THREAT_BY_MINOR: [Score; 8] = [
    S!(0, 0), S!(5, 32), S!(55, 41), S!(77, 56), S!(89, 119), S!(79, 162),
    S0, S0,
];

const THREAT_BY_ROOK: [Score; 8] = [
    S!(0, 0), S!(3, 44), S!(37, 68), S!(42, 60), S!(0, 39), S!(58, 43),
    S0, S0,
];

// PASSED_RANK[Rank] contains a bonus according to the rank of a passed pawn.
const PASSED_RANK: [Score; 8] = [
    S!(0, 0), S!(9, 28), S!(15, 31), S!(17, 39), S!(64, 70), S!(171, 177),
    S!(277, 260), S!(0, 0),
];

// BISHOP_PAWNS[distance from edge] contains a file-dependent penalty for
// pawns on squares of the same color as our bishop.
const BISHOP_PAWNS: [Score; 4] = [ S!(3, 8), S!(3, 9), S!(2, 8), S!(3, 8) ];

// KING_ATTACK_WEIGHTS[PieceType] contains king attack weights by piece type.
const KING_ATTACK_WEIGHTS: [i32; 8] = [ 0, 0, 81, 52, 44, 10, 0, 0 ];

// SAFE_CHECK[PieceType][single/multiple] contains the penalties for enemy
// safe checks, higher if there are several checking squares.
const SAFE_CHECK: [[i32; 2]; 8] = [
    [0, 0], [0, 0], [803, 1292], [639, 974], [1087, 1878], [759, 1132],
    [0, 0], [0, 0],
];

// Assorted bonuses and penalties
const BAD_OUTPOST:           Score = S!( -7, 36);
const BISHOP_ON_KING_RING:   Score = S!( 24,  0);
const BISHOP_XRAY_PAWNS:     Score = S!(  4,  5);
const CORNERED_BISHOP:       Score = S!( 50, 50);
const FLANK_ATTACKS:         Score = S!(  8,  0);
const HANGING:               Score = S!( 69, 36);
const KNIGHT_ON_QUEEN:       Score = S!( 16, 11);
const LONG_DIAGONAL_BISHOP:  Score = S!( 45,  0);
const MINOR_BEHIND_PAWN:     Score = S!( 18,  3);
const OUTPOST:               Score = S!( 30, 21);
const PASSED_FILE:           Score = S!( 11,  8);
const PAWNLESS_FLANK:        Score = S!( 17, 95);
const REACHABLE_OUTPOST:     Score = S!( 31, 22);
const RESTRICTED_PIECE:      Score = S!(  7,  7);
const ROOK_ON_KING_RING:     Score = S!( 16,  0);
const ROOK_ON_QUEEN_FILE:    Score = S!(  6, 11);
const SLIDER_ON_QUEEN:       Score = S!( 60, 18);
const THREAT_BY_KING:        Score = S!( 24, 89);
const THREAT_BY_PAWN_PUSH:   Score = S!( 48, 39);
const THREAT_BY_SAFE_PAWN:   Score = S!(173, 94);
const TRAPPED_ROOK:          Score = S!( 55, 13);
const WEAK_QUEEN:            Score = S!( 56, 15);
const WEAK_QUEEN_PROTECTION: Score = S!( 14,  0);

// Thresholds for lazy and space evaluation
const LAZY_THRESHOLD1: i32 = 3130;
const LAZY_THRESHOLD2: i32 = 2204;
const SPACE_THRESHOLD: Value = Value(11551);

// Terms collected when tracing. The first eight slots hold the piece type
// terms.
const TERM_MATERIAL:  usize = 8;
const TERM_IMBALANCE: usize = 9;
const TERM_MOBILITY:  usize = 10;
const TERM_THREAT:    usize = 11;
const TERM_PASSED:    usize = 12;
const TERM_SPACE:     usize = 13;
const TERM_WINNABLE:  usize = 14;
const TERM_TOTAL:     usize = 15;
const TERM_NB:        usize = 16;

static mut TRACING: bool = false;
static mut TRACE_SCORES: [[Score; 2]; TERM_NB] = [[Score::ZERO; 2]; TERM_NB];

fn tracing() -> bool {
    unsafe { TRACING }
}

fn trace_add(term: usize, c: Color, s: Score) {
    unsafe {
        if TRACING {
            TRACE_SCORES[term][c.0 as usize] = s;
        }
    }
}

// initialize() computes king and pawn attacks and the king ring bitboard
// for a given color. This is done at the beginning of the evaluation.

fn initialize<Us: ColorTrait>(pos: &Position, ei: &mut EvalInfo) {
    let us = Us::COLOR;
    let them = if us == WHITE { BLACK } else { WHITE };
    let down = if us == WHITE { SOUTH } else { NORTH };
    let low_ranks =
        if us == WHITE { RANK2_BB | RANK3_BB } else { RANK7_BB | RANK6_BB };

    let ksq = pos.square(us, KING);

    let dbl_attack_by_pawn =
        pawn_double_attacks_bb(us, pos.pieces_cp(us, PAWN));

    // Find our pawns that are blocked or on the first two ranks
    let b = pos.pieces_cp(us, PAWN) & (pos.pieces().shift(down) | low_ranks);

    // Squares occupied by those pawns, by our king or queen, by blockers to
    // attacks on our king or controlled by enemy pawns are excluded from the
    // mobility area.
    ei.mobility_area[us.0 as usize] = !(b
        | pos.pieces_cpp(us, KING, QUEEN)
        | pos.blockers_for_king(us)
        | ei.pe.pawn_attacks(them));

    // Initialize the attack bitboards with the king and pawn information
    let b = pos.attacks_from(KING, ksq);
    ei.attacked_by[us.0 as usize][KING.0 as usize] = b;
    ei.attacked_by[us.0 as usize][PAWN.0 as usize] = ei.pe.pawn_attacks(us);
    ei.attacked_by[us.0 as usize][ALL_PIECES.0 as usize] =
        b | ei.attacked_by[us.0 as usize][PAWN.0 as usize];
    ei.attacked_by2[us.0 as usize] = dbl_attack_by_pawn
        | (b & ei.attacked_by[us.0 as usize][PAWN.0 as usize]);

    // Init our king safety tables
    let s = Square::make(
        std::cmp::max(FILE_B, std::cmp::min(FILE_G, ksq.file())),
        std::cmp::max(RANK_2, std::cmp::min(RANK_7, ksq.rank())));
    ei.king_ring[us.0 as usize] = pos.attacks_from(KING, s) | s;

    ei.king_attackers_count[them.0 as usize] = popcount(
        ei.king_ring[us.0 as usize] & ei.pe.pawn_attacks(them)) as i32;
    ei.king_attacks_count[them.0 as usize] = 0;
    ei.king_attackers_weight[them.0 as usize] = 0;

    // Remove from the king ring the squares defended by two pawns
    ei.king_ring[us.0 as usize] &= !dbl_attack_by_pawn;
}

// evaluate_pieces() assigns bonuses and penalties to the pieces of a given
// color and type.

fn evaluate_pieces<Us: ColorTrait, Pt: PieceTypeTrait>(
    pos: &Position, ei: &mut EvalInfo
) -> Score {
    let us = Us::COLOR;
    let pt = Pt::TYPE;
    let them = if us == WHITE { BLACK } else { WHITE };
    let down = if us == WHITE { SOUTH } else { NORTH };
    let outpost_ranks =
        if us == WHITE { RANK4_BB | RANK5_BB | RANK6_BB }
        else { RANK5_BB | RANK4_BB | RANK3_BB };

    let mut score = Score::ZERO;

    ei.attacked_by[us.0 as usize][pt.0 as usize] = Bitboard(0);

    for s in pos.square_list(us, pt) {
        // Find attacked squares, including x-ray attacks for bishops and
        // rooks
        let mut b = match pt {
            BISHOP => {
                attacks_bb(BISHOP, s, pos.pieces() ^ pos.pieces_p(QUEEN))
            }
            ROOK => {
                attacks_bb(ROOK, s, pos.pieces() ^ pos.pieces_p(QUEEN)
                    ^ pos.pieces_cp(us, ROOK))
            }
            _ => pos.attacks_from(pt, s)
        };

        if pos.blockers_for_king(us) & s != 0 {
            b &= line_bb(pos.square(us, KING), s);
        }

        ei.attacked_by2[us.0 as usize] |=
            ei.attacked_by[us.0 as usize][ALL_PIECES.0 as usize] & b;
        ei.attacked_by[us.0 as usize][pt.0 as usize] |= b;
        ei.attacked_by[us.0 as usize][ALL_PIECES.0 as usize] |= b;

        if b & ei.king_ring[them.0 as usize] != 0 {
            ei.king_attackers_count[us.0 as usize] += 1;
            ei.king_attackers_weight[us.0 as usize] +=
                KING_ATTACK_WEIGHTS[pt.0 as usize];
            ei.king_attacks_count[us.0 as usize] += popcount(
                b & ei.attacked_by[them.0 as usize][KING.0 as usize]) as i32;
        } else if pt == ROOK
            && file_bb(s.file()) & ei.king_ring[them.0 as usize] != 0
        {
            score += ROOK_ON_KING_RING;
        } else if pt == BISHOP
            && attacks_bb(BISHOP, s, pos.pieces_p(PAWN))
                & ei.king_ring[them.0 as usize] != 0
        {
            score += BISHOP_ON_KING_RING;
        }

        let mob = popcount(b & ei.mobility_area[us.0 as usize]);

        ei.mobility[us.0 as usize] +=
            MOBILITY_BONUS[(pt.0 - 2) as usize][mob as usize];

        if pt == KNIGHT || pt == BISHOP {
            // Bonus if the piece is on an outpost square or can reach one.
            // A knight on a side outpost with no relevant targets to attack
            // is instead penalized.
            let targets = pos.pieces_c(them) & !pos.pieces_p(PAWN);
            let bb = outpost_ranks
                & ei.attacked_by[us.0 as usize][PAWN.0 as usize]
                & !ei.pe.pawn_attacks_span(them);

            if pt == KNIGHT
                && bb & s & !CENTER_FILES != 0
                && b & targets == 0
                && !more_than_one(targets
                    & if QUEEN_SIDE & s != 0 { QUEEN_SIDE } else { KING_SIDE })
            {
                score += BAD_OUTPOST;
            } else if bb & s != 0 {
                score += OUTPOST * if pt == KNIGHT { 2 } else { 1 };
            } else if pt == KNIGHT && bb & b & !pos.pieces_c(us) != 0 {
                score += REACHABLE_OUTPOST;
            }

            // Bonus for a knight or bishop shielded by a pawn
            if pos.pieces_p(PAWN).shift(down) & s != 0 {
                score += MINOR_BEHIND_PAWN;
            }

            // Penalty if the piece is far from our king
            score -= KING_PROTECTOR[(pt == BISHOP) as usize]
                * Square::distance(pos.square(us, KING), s) as i32;

            if pt == BISHOP {
                // Penalty according to the number of our pawns on the same
                // color square as the bishop, bigger when the center files
                // are blocked with pawns and smaller when the bishop is
                // outside the pawn chain.
                let blocked =
                    pos.pieces_cp(us, PAWN) & pos.pieces().shift(down);

                score -= BISHOP_PAWNS[edge_distance(s.file()) as usize]
                    * pos.pawns_on_same_color_squares(us, s) as i32
                    * ((ei.attacked_by[us.0 as usize][PAWN.0 as usize]
                            & s == 0) as i32
                        + popcount(blocked & CENTER_FILES) as i32);

                // Penalty for all enemy pawns x-rayed
                score -= BISHOP_XRAY_PAWNS * popcount(
                    pseudo_attacks(BISHOP, s) & pos.pieces_cp(them, PAWN))
                    as i32;

                // Bonus for a bishop on a long diagonal which can "see"
                // both center squares
                if more_than_one(
                    attacks_bb(BISHOP, s, pos.pieces_p(PAWN)) & CENTER)
                {
                    score += LONG_DIAGONAL_BISHOP;
                }

                // An important Chess960 pattern: a cornered bishop blocked
                // by a friendly pawn diagonally in front of it is a very
                // serious problem, especially when that pawn is also
                // blocked.
                if pos.is_chess960()
                    && (s == Square::A1.relative(us)
                        || s == Square::H1.relative(us))
                {
                    let d = pawn_push(us)
                        + (if s.file() == FILE_A { EAST } else { WEST });
                    if pos.piece_on(s + d) == Piece::make(us, PAWN) {
                        score -= if !pos.empty(s + d + pawn_push(us)) {
                            CORNERED_BISHOP * 4
                        } else if pos.piece_on(s + 2 * d)
                            == Piece::make(us, PAWN)
                        {
                            CORNERED_BISHOP * 2
                        } else {
                            CORNERED_BISHOP
                        }
                    }
                }
            }
        }

        if pt == ROOK {
            // Bonus for a rook on the same file as their queen
            if file_bb(s.file()) & pos.pieces_p(QUEEN) != 0 {
                score += ROOK_ON_QUEEN_FILE;
            }

            // Bonus for a rook on an open or semi-open file
            if pos.is_on_semiopen_file(us, s) {
                score += ROOK_ON_FILE
                    [pos.is_on_semiopen_file(them, s) as usize];
            }

            // Penalty when trapped by the king, even more if the king
            // cannot castle
            else if mob <= 3 {
                let kf = pos.square(us, KING).file();

                if (kf < FILE_E) == (s.file() < kf) {
                    score -= TRAPPED_ROOK
                        * (1 + (!pos.can_castle(us)) as i32);
                }
            }
        }

        if pt == QUEEN {
            // Penalty if any relative pin or discovered attack against the
            // queen
            let mut pinners = Bitboard(0);
            if pos.slider_blockers(pos.pieces_cpp(them, ROOK, BISHOP), s,
                &mut pinners) != 0
            {
                score -= WEAK_QUEEN;
            }
        }
    }

    trace_add(pt.0 as usize, us, score);

    score
}

// evaluate_king() assigns bonuses and penalties to a king of a given color

fn evaluate_king<Us: ColorTrait>(pos: &Position, ei: &mut EvalInfo) -> Score {
    let us = Us::COLOR;
    let them = if us == WHITE { BLACK } else { WHITE };
    let camp = if us == WHITE { ALL_SQUARES ^ RANK6_BB ^ RANK7_BB ^ RANK8_BB }
               else           { ALL_SQUARES ^ RANK1_BB ^ RANK2_BB ^ RANK3_BB };

    let ksq = pos.square(us, KING);

    // Init the score with king shelter and enemy pawns storm
    let mut score = ei.pe.king_safety::<Us>(pos);

    // Attacked squares defended at most once by our queen or king
    let weak = ei.attacked_by[them.0 as usize][ALL_PIECES.0 as usize]
        & !ei.attacked_by2[us.0 as usize]
        & (!ei.attacked_by[us.0 as usize][ALL_PIECES.0 as usize]
            | ei.attacked_by[us.0 as usize][KING.0 as usize]
            | ei.attacked_by[us.0 as usize][QUEEN.0 as usize]);

    // Analyse the safe enemy's checks which are possible on the next move
    let safe = !pos.pieces_c(them)
        & (!ei.attacked_by[us.0 as usize][ALL_PIECES.0 as usize]
            | (weak & ei.attacked_by2[them.0 as usize]));

    let b1 = attacks_bb(ROOK, ksq, pos.pieces() ^ pos.pieces_cp(us, QUEEN));
    let b2 = attacks_bb(BISHOP, ksq, pos.pieces() ^ pos.pieces_cp(us, QUEEN));

    let mut king_danger = 0;
    let mut unsafe_checks = Bitboard(0);

    // Enemy rook checks
    let rook_checks =
        b1 & ei.attacked_by[them.0 as usize][ROOK.0 as usize] & safe;
    if rook_checks != 0 {
        king_danger +=
            SAFE_CHECK[ROOK.0 as usize][more_than_one(rook_checks) as usize];
    } else {
        unsafe_checks |=
            b1 & ei.attacked_by[them.0 as usize][ROOK.0 as usize];
    }

    // Enemy queen safe checks: count them only if the checks are from
    // squares from which the opponent cannot give a double check
    let queen_checks = (b1 | b2)
        & ei.attacked_by[them.0 as usize][QUEEN.0 as usize]
        & safe
        & !(ei.attacked_by[us.0 as usize][QUEEN.0 as usize] | rook_checks);
    if queen_checks != 0 {
        king_danger +=
            SAFE_CHECK[QUEEN.0 as usize][more_than_one(queen_checks) as usize];
    }

    // Enemy bishop checks: count them only if they are from squares from
    // which the opponent cannot give a queen check
    let bishop_checks = b2
        & ei.attacked_by[them.0 as usize][BISHOP.0 as usize]
        & safe
        & !queen_checks;
    if bishop_checks != 0 {
        king_danger += SAFE_CHECK
            [BISHOP.0 as usize][more_than_one(bishop_checks) as usize];
    } else {
        unsafe_checks |=
            b2 & ei.attacked_by[them.0 as usize][BISHOP.0 as usize];
    }

    // Enemy knight checks
    let knight_checks = pos.attacks_from(KNIGHT, ksq)
        & ei.attacked_by[them.0 as usize][KNIGHT.0 as usize];
    if knight_checks & safe != 0 {
        king_danger += SAFE_CHECK[KNIGHT.0 as usize]
            [more_than_one(knight_checks & safe) as usize];
    } else {
        unsafe_checks |= knight_checks;
    }

    // Unsafe checks count only from squares in the attacker's mobility
    // area.
    unsafe_checks &= ei.mobility_area[them.0 as usize];

    // Find the squares that the opponent attacks in our king flank, the
    // squares which they attack twice in that flank, and the squares that
    // we defend.
    let kf = ksq.file();
    let b1 = ei.attacked_by[them.0 as usize][ALL_PIECES.0 as usize]
        & KING_FLANK[kf as usize] & camp;
    let b2 = b1 & ei.attacked_by2[them.0 as usize];
    let b3 = ei.attacked_by[us.0 as usize][ALL_PIECES.0 as usize]
        & KING_FLANK[kf as usize] & camp;

    let king_flank_attack = (popcount(b1) + popcount(b2)) as i32;
    let king_flank_defense = popcount(b3) as i32;

    king_danger +=
        ei.king_attackers_count[them.0 as usize]
            * ei.king_attackers_weight[them.0 as usize]
        + 183 * popcount(ei.king_ring[us.0 as usize] & weak) as i32
        + 148 * popcount(unsafe_checks) as i32
        +  98 * popcount(pos.blockers_for_king(us)) as i32
        +  69 * ei.king_attacks_count[them.0 as usize]
        +   3 * king_flank_attack * king_flank_attack / 8
        + (ei.mobility[them.0 as usize] - ei.mobility[us.0 as usize]).mg().0
        - 873 * (pos.count(them, QUEEN) == 0) as i32
        - 100 * (ei.attacked_by[us.0 as usize][KNIGHT.0 as usize]
            & ei.attacked_by[us.0 as usize][KING.0 as usize] != 0) as i32
        -   6 * score.mg().0 / 8
        -   4 * king_flank_defense
        +  37;

    // Transform the king_danger units into a Score and subtract it from
    // the evaluation
    if king_danger > 100 {
        score -= Score::make(king_danger * king_danger / 4096,
            king_danger / 16);
    }

    // Penalty when our king is on a pawnless flank
    if pos.pieces_p(PAWN) & KING_FLANK[kf as usize] == 0 {
        score -= PAWNLESS_FLANK;
    }

    // Penalty if the king flank is under attack, potentially moving toward
    // the king
    score -= FLANK_ATTACKS * king_flank_attack;

    trace_add(KING.0 as usize, us, score);

    score
}

// evaluate_threats() assigns bonuses according to the types of the
// attacking and the attacked pieces.

fn evaluate_threats<Us: ColorTrait>(pos: &Position, ei: &EvalInfo) -> Score {
    let us = Us::COLOR;
    let them     = if us == WHITE { BLACK    } else { WHITE };
    let up       = if us == WHITE { NORTH    } else { SOUTH };
    let trank3bb = if us == WHITE { RANK3_BB } else { RANK6_BB };

    let mut score = Score::ZERO;

    // Non-pawn enemies
    let non_pawn_enemies = pos.pieces_c(them) & !pos.pieces_p(PAWN);

    // Squares strongly protected by the enemy, either because they defend
    // the square with a pawn, or because they defend the square twice and
    // we don't.
    let strongly_protected =
        ei.attacked_by[them.0 as usize][PAWN.0 as usize]
        | (ei.attacked_by2[them.0 as usize] & !ei.attacked_by2[us.0 as usize]);

    // Non-pawn enemies, strongly protected
    let defended = non_pawn_enemies & strongly_protected;

    // Enemies not strongly protected and under our attack
    let weak = pos.pieces_c(them)
        & !strongly_protected
        & ei.attacked_by[us.0 as usize][ALL_PIECES.0 as usize];

    // Bonus according to the kind of attacking pieces
    if defended | weak != 0 {
        let b = (defended | weak)
            & (ei.attacked_by[us.0 as usize][KNIGHT.0 as usize]
                | ei.attacked_by[us.0 as usize][BISHOP.0 as usize]);
        for s in b {
            score += THREAT_BY_MINOR[pos.piece_on(s).piece_type().0 as usize];
        }

        let b = weak & ei.attacked_by[us.0 as usize][ROOK.0 as usize];
        for s in b {
            score += THREAT_BY_ROOK[pos.piece_on(s).piece_type().0 as usize];
        }

        if weak & ei.attacked_by[us.0 as usize][KING.0 as usize] != 0 {
            score += THREAT_BY_KING;
        }

        let b = !ei.attacked_by[them.0 as usize][ALL_PIECES.0 as usize]
            | (non_pawn_enemies & ei.attacked_by2[us.0 as usize]);
        score += HANGING * popcount(weak & b) as i32;

        // Additional bonus if a weak piece is only protected by a queen
        score += WEAK_QUEEN_PROTECTION * popcount(
            weak & ei.attacked_by[them.0 as usize][QUEEN.0 as usize]) as i32;
    }

    // Bonus for restricting their piece moves
    let b = ei.attacked_by[them.0 as usize][ALL_PIECES.0 as usize]
        & !strongly_protected
        & ei.attacked_by[us.0 as usize][ALL_PIECES.0 as usize];
    score += RESTRICTED_PIECE * popcount(b) as i32;

    // Protected or unattacked squares
    let safe = !ei.attacked_by[them.0 as usize][ALL_PIECES.0 as usize]
        | ei.attacked_by[us.0 as usize][ALL_PIECES.0 as usize];

    // Bonus for attacking enemy pieces with our relatively safe pawns
    let b = pawn_attacks_bb(us, pos.pieces_cp(us, PAWN) & safe)
        & non_pawn_enemies;
    score += THREAT_BY_SAFE_PAWN * popcount(b) as i32;

    // Find the squares where our pawns can push on the next move
    let mut b = pos.pieces_cp(us, PAWN).shift(up) & !pos.pieces();
    b |= (b & trank3bb).shift(up) & !pos.pieces();

    // Keep only the squares which are relatively safe
    b &= !ei.attacked_by[them.0 as usize][PAWN.0 as usize] & safe;

    // Bonus for safe pawn threats on the next move
    let b = pawn_attacks_bb(us, b) & non_pawn_enemies;
    score += THREAT_BY_PAWN_PUSH * popcount(b) as i32;

    // Bonus for threats on the next moves against the enemy queen
    if pos.count(them, QUEEN) == 1 {
        let queen_imbalance =
            pos.count(WHITE, QUEEN) + pos.count(BLACK, QUEEN) == 1;

        let s = pos.square(them, QUEEN);
        let safe = ei.mobility_area[us.0 as usize]
            & !pos.pieces_cp(us, PAWN)
            & !strongly_protected;

        let b = ei.attacked_by[us.0 as usize][KNIGHT.0 as usize]
            & pos.attacks_from(KNIGHT, s);
        score += KNIGHT_ON_QUEEN * popcount(b & safe) as i32
            * (1 + queen_imbalance as i32);

        let b = (ei.attacked_by[us.0 as usize][BISHOP.0 as usize]
                & attacks_bb(BISHOP, s, pos.pieces()))
            | (ei.attacked_by[us.0 as usize][ROOK.0 as usize]
                & attacks_bb(ROOK, s, pos.pieces()));
        score += SLIDER_ON_QUEEN
            * popcount(b & safe & ei.attacked_by2[us.0 as usize]) as i32
            * (1 + queen_imbalance as i32);
    }

    trace_add(TERM_THREAT, us, score);

    score
}

// evaluate_passed() evaluates the passed pawns and candidate passed pawns
// of the given color.

fn evaluate_passed<Us: ColorTrait>(pos: &Position, ei: &EvalInfo) -> Score {
    let us = Us::COLOR;
    let them = if us == WHITE { BLACK } else { WHITE };
    let up   = if us == WHITE { NORTH } else { SOUTH };
    let down = if us == WHITE { SOUTH } else { NORTH };

    let king_proximity = |c: Color, s: Square| {
        std::cmp::min(Square::distance(pos.square(c, KING), s), 5) as i32
    };

    let mut score = Score::ZERO;

    let mut b = ei.pe.passed_pawns(us);

    let blocked_passers = b & pos.pieces_cp(them, PAWN).shift(down);
    if blocked_passers != 0 {
        let helpers = pos.pieces_cp(us, PAWN).shift(up)
            & !pos.pieces_c(them)
            & (!ei.attacked_by2[them.0 as usize]
                | ei.attacked_by[us.0 as usize][ALL_PIECES.0 as usize]);

        // Remove blocked candidate passers that don't have help to pass
        b &= !blocked_passers | helpers.shift(WEST) | helpers.shift(EAST);
    }

    for s in b {
        debug_assert!(
            pos.pieces_cp(them, PAWN) & forward_file_bb(us, s + up) == 0
        );

        let r = s.relative_rank(us);

        let mut bonus = PASSED_RANK[r as usize];

        if r > RANK_3 {
            let w = 5 * r as i32 - 13;
            let block_sq = s + up;

            // Adjust bonus based on the king's proximity
            bonus += Score::make(0,
                (king_proximity(them, block_sq) * 19 / 4
                    - king_proximity(us, block_sq) * 2) * w);

            // If block_sq is not the queening square then consider also a
            // second push
            if r != RANK_7 {
                bonus -= Score::make(0,
                    king_proximity(us, block_sq + up) * w);
            }

            // If the pawn is free to advance, then increase the bonus
            if pos.empty(block_sq) {
                let squares_to_queen = forward_file_bb(us, s);
                let mut unsafe_squares = passed_pawn_mask(us, s);

                let bb = forward_file_bb(them, s) & pos.pieces_pp(ROOK, QUEEN);

                if pos.pieces_c(them) & bb == 0 {
                    unsafe_squares &=
                        ei.attacked_by[them.0 as usize][ALL_PIECES.0 as usize]
                        | pos.pieces_c(them);
                }

                // If there are no enemy pieces or attacks on the span of
                // the passed pawn, assign a big bonus. A smaller bonus if
                // the attacked squares are all covered by our pawns,
                // smaller again if the path to the queen is not attacked,
                // and smaller still if it is attacked but the block square
                // is not.
                let mut k =
                    if unsafe_squares == 0 { 36 }
                    else if unsafe_squares
                        & !ei.attacked_by[us.0 as usize][PAWN.0 as usize] == 0
                    { 30 }
                    else if unsafe_squares & squares_to_queen == 0 { 17 }
                    else if unsafe_squares & block_sq == 0 { 7 }
                    else { 0 };

                // Assign a larger bonus if the block square is defended
                if pos.pieces_c(us) & bb != 0
                    || ei.attacked_by[us.0 as usize][ALL_PIECES.0 as usize]
                        & block_sq != 0
                {
                    k += 5;
                }

                bonus += Score::make(k * w, k * w);
            }
        } // r > RANK_3

        score += bonus - PASSED_FILE * edge_distance(s.file()) as i32;
    }

    trace_add(TERM_PASSED, us, score);

    score
}

// evaluate_space() computes a space evaluation for a given side, aiming to
// improve game play in the opening. It is computed as the number of safe
// squares available for minor pieces on the central four files on ranks 2
// to 4. Completely safe squares behind a friendly pawn are counted twice.
// Finally, the space bonus is multiplied by a weight which scales with
// occupancy and the number of blocked pawns.

fn evaluate_space<Us: ColorTrait>(pos: &Position, ei: &EvalInfo) -> Score {
    let us = Us::COLOR;
    let them = if us == WHITE { BLACK } else { WHITE };
    let down = if us == WHITE { SOUTH } else { NORTH };
    let space_mask = if us == WHITE {
        CENTER_FILES & (RANK2_BB | RANK3_BB | RANK4_BB)
    } else {
        CENTER_FILES & (RANK7_BB | RANK6_BB | RANK5_BB)
    };

    // Find the available squares for our pieces inside the space mask area
    let safe = space_mask
        & !pos.pieces_cp(us, PAWN)
        & !ei.attacked_by[them.0 as usize][PAWN.0 as usize];

    // Find all squares which are at most three squares behind some
    // friendly pawn
    let mut behind = pos.pieces_cp(us, PAWN);
    behind |= behind.shift(down);
    behind |= behind.shift(down).shift(down);

    let bonus = popcount(safe) as i32
        + popcount(behind & safe
            & !ei.attacked_by[them.0 as usize][ALL_PIECES.0 as usize]) as i32;
    let weight = pos.count(us, ALL_PIECES) - 3
        + std::cmp::min(ei.pe.blocked_count(), 9);

    let score = Score::make(bonus * weight * weight / 16, 0);

    trace_add(TERM_SPACE, us, score);

    score
}

// winnable() adjusts the midgame and endgame score components based on the
// known attacking/defending status of the players, then interpolates
// between them based on the remaining material.

fn winnable(pos: &Position, ei: &EvalInfo, score: Score) -> Value {
    let wksq = pos.square(WHITE, KING);
    let bksq = pos.square(BLACK, KING);

    let outflanking = u32::distance(wksq.file(), bksq.file()) as i32
        - u32::distance(wksq.rank(), bksq.rank()) as i32;

    let pawns_on_both_flanks = pos.pieces_p(PAWN) & QUEEN_SIDE != 0
        && pos.pieces_p(PAWN) & KING_SIDE != 0;

    let almost_unwinnable = outflanking < 0 && !pawns_on_both_flanks;

    let infiltration = wksq.rank() > RANK_4 || bksq.rank() < RANK_5;

    // Compute the initiative bonus for the attacking side
    let complexity = 9 * ei.pe.passed_count() as i32
        + 12 * (pos.count(WHITE, PAWN) + pos.count(BLACK, PAWN))
        +  9 * outflanking
        + 21 * pawns_on_both_flanks as i32
        + 24 * infiltration as i32
        + 51 * (pos.non_pawn_material() == Value::ZERO) as i32
        - 43 * almost_unwinnable as i32
        - 110;

    let mut mg = score.mg().0;
    let mut eg = score.eg().0;

    // Now apply the bonus: note that we find the attacking side by
    // extracting the sign of the midgame or endgame values, and that we
    // carefully cap the bonus so that the midgame and endgame scores do
    // not change sign after the bonus.
    let u = ((mg > 0) as i32 - (mg < 0) as i32)
        * std::cmp::max(std::cmp::min(complexity + 50, 0), -mg.abs());
    let v = ((eg > 0) as i32 - (eg < 0) as i32)
        * std::cmp::max(complexity, -eg.abs());

    mg += u;
    eg += v;

    trace_add(TERM_WINNABLE, WHITE, Score::make(u, v));

    // Compute the scale factor for the winning side
    let strong_side = if eg > 0 { WHITE } else { BLACK };
    let mut sf = ei.me.scale_factor(pos, strong_side).0;

    // If the scale factor is not already specific, scale down via general
    // heuristics
    if sf == ScaleFactor::NORMAL.0 {
        if pos.opposite_bishops() {
            sf = if pos.non_pawn_material_c(WHITE) == BishopValueMg
                && pos.non_pawn_material_c(BLACK) == BishopValueMg
            {
                // For pure opposite-colored bishop endgames use a scale
                // factor based on the number of passed pawns of the strong
                // side
                18 + 4 * popcount(ei.pe.passed_pawns(strong_side)) as i32
            } else {
                // For every other opposite-colored bishop endgame use a
                // scale factor based on the number of pieces of the strong
                // side
                22 + 3 * pos.count(strong_side, ALL_PIECES)
            };
        } else if pos.non_pawn_material_c(WHITE) == RookValueMg
            && pos.non_pawn_material_c(BLACK) == RookValueMg
            && pos.count(strong_side, PAWN)
                - pos.count(!strong_side, PAWN) <= 1
            && (KING_SIDE & pos.pieces_cp(strong_side, PAWN) != 0)
                != (QUEEN_SIDE & pos.pieces_cp(strong_side, PAWN) != 0)
            && pos.attacks_from(KING, pos.square(!strong_side, KING))
                & pos.pieces_cp(!strong_side, PAWN) != 0
        {
            // Rook endgames where the strong side has no overwhelming pawn
            // advantage, its pawns are all on one flank and the weak king
            // defends its pawns, are drawish
            sf = 36;
        } else if pos.count(WHITE, QUEEN) + pos.count(BLACK, QUEEN) == 1 {
            // For queen vs no queen endgames use a scale factor based on
            // the number of minors of the side without the queen
            sf = 37 + 3 * if pos.count(WHITE, QUEEN) == 1 {
                pos.count(BLACK, BISHOP) + pos.count(BLACK, KNIGHT)
            } else {
                pos.count(WHITE, BISHOP) + pos.count(WHITE, KNIGHT)
            };
        } else {
            // In every other case, reduce the scale factor based on the
            // number of pawns of the strong side
            sf = std::cmp::min(sf, 36 + 7 * pos.count(strong_side, PAWN))
                - 4 * (!pawns_on_both_flanks as i32);
        }
    }

    // Interpolate between the middlegame and (scaled by sf) endgame score
    let phase = ei.me.game_phase();
    let v = (mg * phase
        + eg * (PHASE_MIDGAME - phase) * sf / ScaleFactor::NORMAL.0)
        / PHASE_MIDGAME;

    Value(v)
}

// evaluate_classical() computes the hand-crafted evaluation of the position
// and returns its value from the point of view of the side to move.

pub fn evaluate_classical(pos: &Position) -> Value {
    debug_assert!(pos.checkers() == 0);

    // Probe the material hash table
    let me = material::probe(pos);

    // If we have a specialized evaluation function for the current material
    // configuration, call it and return.
    if me.specialized_eval_exists() {
        return me.evaluate(pos);
    }

    // Initialize score by reading the incrementally updated scores included
    // in the position object (material + piece square tables), the material
    // imbalance and the trend bias. Score is computed internally from the
    // white point of view.
    let mut score = pos.psq_score() + me.imbalance() + pos.trend;

    // Probe the pawn hash table
    let pe = pawns::probe(pos);
    score += pe.pawn_score(WHITE) - pe.pawn_score(BLACK);

    trace_add(TERM_MATERIAL, WHITE, pos.psq_score());
    trace_add(TERM_IMBALANCE, WHITE, me.imbalance());
    trace_add(PAWN.0 as usize, WHITE, pe.pawn_score(WHITE));
    trace_add(PAWN.0 as usize, BLACK, pe.pawn_score(BLACK));

    // Early exit if the score is high
    let lazy_skip = |score: Score, threshold: i32| {
        !tracing()
            && (score.mg().0 + score.eg().0).abs() > threshold
                + pos.best_value.0.abs() * 5 / 4
                + pos.non_pawn_material().0 / 32
    };

    let mut ei = EvalInfo::new(me, pe);

    if !lazy_skip(score, LAZY_THRESHOLD1) {
        // Main evaluation begins here
        initialize::<White>(pos, &mut ei);
        initialize::<Black>(pos, &mut ei);

        // The piece evaluation comes first and also populates the attack
        // bitboards consumed by the later terms
        score +=  evaluate_pieces::<White, Knight>(pos, &mut ei)
                - evaluate_pieces::<Black, Knight>(pos, &mut ei);
        score +=  evaluate_pieces::<White, Bishop>(pos, &mut ei)
                - evaluate_pieces::<Black, Bishop>(pos, &mut ei);
        score +=  evaluate_pieces::<White, Rook  >(pos, &mut ei)
                - evaluate_pieces::<Black, Rook  >(pos, &mut ei);
        score +=  evaluate_pieces::<White, Queen >(pos, &mut ei)
                - evaluate_pieces::<Black, Queen >(pos, &mut ei);

        score += ei.mobility[WHITE.0 as usize] - ei.mobility[BLACK.0 as usize];

        trace_add(TERM_MOBILITY, WHITE, ei.mobility[WHITE.0 as usize]);
        trace_add(TERM_MOBILITY, BLACK, ei.mobility[BLACK.0 as usize]);

        score +=  evaluate_king::<White>(pos, &mut ei)
                - evaluate_king::<Black>(pos, &mut ei);

        // Passed pawns need the full attack information including the king
        score +=  evaluate_passed::<White>(pos, &ei)
                - evaluate_passed::<Black>(pos, &ei);

        if !lazy_skip(score, LAZY_THRESHOLD2) {
            score +=  evaluate_threats::<White>(pos, &ei)
                    - evaluate_threats::<Black>(pos, &ei);

            if pos.non_pawn_material() >= SPACE_THRESHOLD {
                score +=  evaluate_space::<White>(pos, &ei)
                        - evaluate_space::<Black>(pos, &ei);
            }
        }
    }

    trace_add(TERM_TOTAL, WHITE, score);

    // Derive a single value from the mg and eg parts of the score
    let mut v = winnable(pos, &ei, score);

    // Evaluation grain
    v = (v / 16) * 16;

    // Side to move point of view
    if pos.side_to_move() == WHITE { v } else { -v }
}

// fix_frc() computes a corrective value for positions with a bishop trapped
// in a corner by a friendly pawn, a pattern the network was not trained on.

fn fix_frc(pos: &Position) -> Value {
    const CORNERS: Bitboard = Bitboard(0x8100000000000081);

    if pos.pieces_p(BISHOP) & CORNERS == 0 {
        return Value::ZERO;
    }

    let penalty = CORNERED_BISHOP.mg().0;
    let mut correction = 0;

    if pos.piece_on(Square::A1) == Piece::make(WHITE, BISHOP)
        && pos.piece_on(Square::B2) == Piece::make(WHITE, PAWN)
    {
        correction -= penalty;
    }

    if pos.piece_on(Square::H1) == Piece::make(WHITE, BISHOP)
        && pos.piece_on(Square::G2) == Piece::make(WHITE, PAWN)
    {
        correction -= penalty;
    }

    if pos.piece_on(Square::A8) == Piece::make(BLACK, BISHOP)
        && pos.piece_on(Square::B7) == Piece::make(BLACK, PAWN)
    {
        correction += penalty;
    }

    if pos.piece_on(Square::H8) == Piece::make(BLACK, BISHOP)
        && pos.piece_on(Square::G7) == Piece::make(BLACK, PAWN)
    {
        correction += penalty;
    }

    if pos.side_to_move() == WHITE {
        Value(5 * correction)
    } else {
        -Value(5 * correction)
    }
}

// evaluate() is the main evaluation function. It blends the network and the
// classical evaluation and returns the value of the position from the point
// of view of the side to move.

pub fn evaluate(pos: &mut Position, ctx: &mut EvalContext) -> Value {
    let mut v = match ctx.network() {
        Some(network) if ctx.options().use_nnue => {
            // With a large material imbalance the classical evaluation is
            // more reliable, but switch to the network faster when
            // shuffling
            let psq = pos.psq_score().eg().abs().0;
            let r50 = pos.rule50_count();
            if 5 * psq > (850 + pos.non_pawn_material().0 / 64) * (5 + r50) {
                evaluate_classical(pos)
            } else {
                let mut nnue_v = nnue::evaluate(network, pos, true);
                if pos.is_chess960() {
                    nnue_v += fix_frc(pos);
                }
                nnue_v
            }
        }
        _ => evaluate_classical(pos),
    };

    // Damp down the evaluation linearly when shuffling
    v = v * (207 - pos.rule50_count()) / 207;

    // Blend in a random bias when playing with a randomized evaluation
    let perturb = ctx.options().random_eval_perturb;
    if perturb > 0 {
        let bias = ctx.random_bias();
        v = Value((perturb * bias.0 + (100 - perturb) * v.0) / 100);
    }

    // Guarantee the evaluation does not hit the tablebase range
    v = std::cmp::max(Value::TB_LOSS_IN_MAX_PLY + 1,
        std::cmp::min(Value::TB_WIN_IN_MAX_PLY - 1, v));

    let waitms = ctx.options().waitms;
    if waitms > 0 {
        std::thread::sleep(std::time::Duration::from_millis(waitms));
    }

    v
}

// trace() computes the classical evaluation of the position with the
// collection of its terms enabled and formats them as a table. Used mostly
// for debugging.

pub fn trace(pos: &Position) -> String {
    fn to_cp(v: Value) -> f64 {
        v.0 as f64 / PawnValueEg.0 as f64
    }

    fn cell(s: Score) -> String {
        format!("{:5.2} {:5.2}", to_cp(s.mg()), to_cp(s.eg()))
    }

    unsafe {
        TRACING = true;
        TRACE_SCORES = [[Score::ZERO; 2]; TERM_NB];
    }

    let v = evaluate_classical(pos);

    // White's point of view
    let v = if pos.side_to_move() == WHITE { v } else { -v };

    let scores = unsafe { TRACE_SCORES };
    unsafe { TRACING = false; }

    let terms: [(usize, &str); 14] = [
        (TERM_MATERIAL, "Material"),
        (TERM_IMBALANCE, "Imbalance"),
        (PAWN.0 as usize, "Pawns"),
        (KNIGHT.0 as usize, "Knights"),
        (BISHOP.0 as usize, "Bishops"),
        (ROOK.0 as usize, "Rooks"),
        (QUEEN.0 as usize, "Queens"),
        (TERM_MOBILITY, "Mobility"),
        (KING.0 as usize, "King safety"),
        (TERM_THREAT, "Threats"),
        (TERM_PASSED, "Passed"),
        (TERM_SPACE, "Space"),
        (TERM_WINNABLE, "Winnable"),
        (TERM_TOTAL, "Total"),
    ];

    let mut out = String::new();
    out.push_str(
        "     Term    |    White    |    Black    |    Total   \n");
    out.push_str(
        "             |   MG    EG  |   MG    EG  |   MG    EG \n");
    out.push_str(
        " ------------+-------------+-------------+------------\n");

    for &(t, name) in terms.iter() {
        if t == TERM_TOTAL {
            out.push_str(
                " ------------+-------------+-------------+------------\n");
        }
        let w = scores[t][WHITE.0 as usize];
        let b = scores[t][BLACK.0 as usize];
        if t == TERM_MATERIAL || t == TERM_IMBALANCE || t == TERM_WINNABLE
            || t == TERM_TOTAL
        {
            out.push_str(&format!("{:>12} |  ----  ---- |  ----  ---- | {}\n",
                name, cell(w - b)));
        } else {
            out.push_str(&format!("{:>12} | {} | {} | {}\n",
                name, cell(w), cell(b), cell(w - b)));
        }
    }

    out.push_str(&format!("\nClassical evaluation: {:+.2} (white side)\n",
        to_cp(v)));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use context::EvalOptions;

    fn make_position(fen: &str) -> Position {
        ::init_for_tests();
        let mut pos = Position::new();
        pos.init_states();
        pos.alloc_caches();
        pos.set(fen, false);
        pos
    }

    // Mirror a FEN top to bottom and swap the colors of all pieces. The
    // evaluation of the mirrored position must be identical, as both are
    // scored for the side to move.
    fn flip_fen(fen: &str) -> String {
        let parts: Vec<&str> = fen.split(' ').collect();

        let swap_case = |c: char| -> char {
            if c.is_ascii_uppercase() {
                c.to_ascii_lowercase()
            } else if c.is_ascii_lowercase() {
                c.to_ascii_uppercase()
            } else {
                c
            }
        };

        let board = parts[0]
            .split('/')
            .rev()
            .map(|rank| rank.chars().map(&swap_case).collect::<String>())
            .collect::<Vec<String>>()
            .join("/");

        let stm = if parts[1] == "w" { "b" } else { "w" };

        let castling: String = if parts[2] == "-" {
            String::from("-")
        } else {
            parts[2].chars().map(&swap_case).collect()
        };

        let ep = if parts[3] == "-" {
            String::from("-")
        } else {
            let mut it = parts[3].chars();
            let file = it.next().unwrap();
            let rank = if it.next().unwrap() == '3' { '6' } else { '3' };
            format!("{}{}", file, rank)
        };

        format!("{} {} {} {} {} {}", board, stm, castling, ep, parts[4],
            parts[5])
    }

    #[test]
    fn startpos_is_balanced() {
        let pos = make_position(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert_eq!(evaluate_classical(&pos), Value::ZERO);
    }

    #[test]
    fn evaluation_is_color_symmetric() {
        let fens = [
            "r1bq1rk1/pp2bppp/2n2n2/2pp4/4P3/2NP1N2/PPP1BPPP/R1BQ1RK1 w - - 0 8",
            "8/2k5/3p4/p2P1p2/P2P1P2/8/8/4K3 w - - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        ];
        for fen in fens.iter() {
            let pos = make_position(fen);
            let flipped = make_position(&flip_fen(fen));
            assert_eq!(evaluate_classical(&pos), evaluate_classical(&flipped),
                "{}", fen);
        }
    }

    #[test]
    fn queen_odds_is_winning_for_the_side_to_move() {
        // White is missing the queen and black is to move
        let pos = make_position(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNB1KBNR b KQkq - 0 1");
        assert!(evaluate_classical(&pos) > Value(1000));
    }

    #[test]
    fn blend_matches_classical_when_network_is_disabled() {
        let mut options = EvalOptions::default();
        options.use_nnue = false;
        options.random_eval_perturb = 0;
        options.waitms = 0;
        let mut ctx = EvalContext::new(options).unwrap();

        let mut pos = make_position(
            "r1bq1rk1/pp2bppp/2n2n2/2pp4/4P3/2NP1N2/PPP1BPPP/R1BQ1RK1 w - - 0 8");
        let classical = evaluate_classical(&pos);
        assert_eq!(evaluate(&mut pos, &mut ctx), classical);
    }

    #[test]
    fn perturbed_eval_stays_within_the_tablebase_range() {
        let mut options = EvalOptions::default();
        options.use_nnue = false;
        options.random_eval_perturb = 100;
        options.random_eval_seed = Some(12345);
        options.waitms = 0;
        let mut ctx = EvalContext::new(options).unwrap();

        let mut pos = make_position(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        for _ in 0..64 {
            let v = evaluate(&mut pos, &mut ctx);
            assert!(v > Value::TB_LOSS_IN_MAX_PLY);
            assert!(v < Value::TB_WIN_IN_MAX_PLY);
        }
    }

    #[test]
    fn trace_lists_all_terms() {
        let pos = make_position(
            "r1bq1rk1/pp2bppp/2n2n2/2pp4/4P3/2NP1N2/PPP1BPPP/R1BQ1RK1 w - - 0 8");
        let table = trace(&pos);
        for name in ["Material", "Mobility", "King safety", "Threats",
            "Passed", "Space", "Winnable", "Total"].iter()
        {
            assert!(table.contains(name), "missing term {}", name);
        }
    }
}
