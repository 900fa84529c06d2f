//! Board topology, mill lines, and occupancy.
//!
//! The topology is generated once at construction and never changes. Only
//! occupants and highlight flags mutate during play.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::{MillError, MillResult, Player, Pos, NUM_POSITIONS, NUM_RINGS, RING_SIZE};

/// A straight line of three positions. Owning all three is a mill.
pub type MillLine = [Pos; 3];

/// The 16 mill lines: 4 per ring, then the 4 spokes.
pub static MILL_LINES: [MillLine; 16] = [
    // Outer ring
    [Pos(0), Pos(1), Pos(2)],
    [Pos(2), Pos(3), Pos(4)],
    [Pos(4), Pos(5), Pos(6)],
    [Pos(6), Pos(7), Pos(0)],
    // Middle ring
    [Pos(8), Pos(9), Pos(10)],
    [Pos(10), Pos(11), Pos(12)],
    [Pos(12), Pos(13), Pos(14)],
    [Pos(14), Pos(15), Pos(8)],
    // Inner ring
    [Pos(16), Pos(17), Pos(18)],
    [Pos(18), Pos(19), Pos(20)],
    [Pos(20), Pos(21), Pos(22)],
    [Pos(22), Pos(23), Pos(16)],
    // Spokes
    [Pos(0), Pos(8), Pos(16)],
    [Pos(2), Pos(10), Pos(18)],
    [Pos(4), Pos(12), Pos(20)],
    [Pos(6), Pos(14), Pos(22)],
];

/// Layout radius per ring (outer, middle, inner). Cosmetic only.
const RING_RADII: [f32; NUM_RINGS as usize] = [150.0, 100.0, 50.0];

/// A single board position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: Pos,
    /// Layout coordinate for presentation. Never read by the rules.
    pub coord: (f32, f32),
    pub neighbors: Vec<Pos>,
    pub occupant: Option<Player>,
    /// Legal-destination hint for presentation. Never read by the rules.
    pub highlighted: bool,
}

impl Node {
    fn generate(pos: Pos) -> Node {
        let ring = pos.ring();
        let i = pos.index();
        let base = ring * RING_SIZE;

        let mut neighbors = vec![
            Pos(base + (i + RING_SIZE - 1) % RING_SIZE),
            Pos(base + (i + 1) % RING_SIZE),
        ];
        if pos.is_spoke() {
            if ring > 0 {
                neighbors.push(Pos::from_ring_index(ring - 1, i));
            }
            if ring + 1 < NUM_RINGS {
                neighbors.push(Pos::from_ring_index(ring + 1, i));
            }
        }

        let angle = i as f32 * std::f32::consts::FRAC_PI_4;
        let radius = RING_RADII[ring as usize];

        Node {
            id: pos,
            coord: (angle.cos() * radius, angle.sin() * radius),
            neighbors,
            occupant: None,
            highlighted: false,
        }
    }
}

/// The 24-position mill board.
#[derive(Clone, Debug, PartialEq)]
pub struct Board {
    nodes: Vec<Node>,
}

impl Board {
    /// Create an empty board with the standard topology.
    pub fn new() -> Board {
        let board = Board {
            nodes: Pos::all().map(Node::generate).collect(),
        };
        debug_assert!(board.validate_connections().is_ok());
        board
    }

    /// All nodes, ordered by id.
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Look up a node by raw id. Returns None for ids outside 0-23.
    #[inline]
    pub fn node(&self, id: u8) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    /// The 16 mill lines.
    #[inline]
    pub fn mill_lines(&self) -> &'static [MillLine] {
        &MILL_LINES
    }

    // ========== Occupancy ==========

    /// Who occupies a position, if anyone.
    #[inline]
    pub fn occupant(&self, pos: Pos) -> Option<Player> {
        self.node(pos.0).and_then(|node| node.occupant)
    }

    /// Check if a position exists and is unoccupied.
    #[inline]
    pub fn is_empty(&self, pos: Pos) -> bool {
        self.node(pos.0).is_some_and(|node| node.occupant.is_none())
    }

    /// Set or clear the occupant of a position.
    /// Does NOT validate - caller must ensure the change is legal.
    #[inline]
    pub fn set_occupant(&mut self, pos: Pos, occupant: Option<Player>) {
        if let Some(node) = self.nodes.get_mut(pos.0 as usize) {
            node.occupant = occupant;
        }
    }

    /// Positions occupied by a player, in ascending order.
    pub fn pieces(&self, player: Player) -> impl Iterator<Item = Pos> + '_ {
        self.nodes
            .iter()
            .filter(move |node| node.occupant == Some(player))
            .map(|node| node.id)
    }

    /// Number of pieces a player has on the board.
    pub fn count(&self, player: Player) -> usize {
        self.pieces(player).count()
    }

    /// All unoccupied positions, in ascending order.
    pub fn empty_positions(&self) -> Vec<Pos> {
        self.nodes
            .iter()
            .filter(|node| node.occupant.is_none())
            .map(|node| node.id)
            .collect()
    }

    // ========== Connectivity ==========

    /// Neighbours of a position (empty for invalid positions).
    #[inline]
    pub fn neighbors(&self, pos: Pos) -> &[Pos] {
        self.node(pos.0)
            .map(|node| node.neighbors.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `to` is adjacent to `from`. Ignores occupancy.
    #[inline]
    pub fn can_move(&self, from: Pos, to: Pos) -> bool {
        self.neighbors(from).contains(&to)
    }

    /// Unoccupied neighbours of `from`.
    pub fn legal_destinations(&self, from: Pos) -> Vec<Pos> {
        self.neighbors(from)
            .iter()
            .copied()
            .filter(|&to| self.is_empty(to))
            .collect()
    }

    /// Check that every neighbour exists and every link is bidirectional.
    pub fn validate_connections(&self) -> MillResult<()> {
        for node in &self.nodes {
            for &to in &node.neighbors {
                let Some(other) = self.node(to.0) else {
                    return Err(MillError::DanglingConnection { from: node.id, to });
                };
                if !other.neighbors.contains(&node.id) {
                    return Err(MillError::OneWayConnection { from: node.id, to });
                }
            }
        }
        Ok(())
    }

    // ========== Mill Detection ==========

    /// Mill lines that pass through a position.
    pub fn mill_lines_through(&self, pos: Pos) -> impl Iterator<Item = &'static MillLine> {
        MILL_LINES.iter().filter(move |line| line.contains(&pos))
    }

    /// Number of positions on a line held by `occupant` (None counts empties).
    #[inline]
    pub fn count_on_line(&self, line: &MillLine, occupant: Option<Player>) -> usize {
        line.iter()
            .filter(|&&pos| self.occupant(pos) == occupant)
            .count()
    }

    #[inline]
    fn owns_line(&self, line: &MillLine, player: Player) -> bool {
        self.count_on_line(line, Some(player)) == 3
    }

    /// Check if a line through `pos` is fully held by `player`.
    ///
    /// Call after the piece has been placed or moved to `pos`.
    pub fn is_mill(&self, pos: Pos, player: Player) -> bool {
        self.mill_lines_through(pos)
            .any(|line| self.owns_line(line, player))
    }

    /// Every line currently held entirely by `player`.
    pub fn all_mills(&self, player: Player) -> Vec<MillLine> {
        MILL_LINES
            .iter()
            .filter(|line| self.owns_line(line, player))
            .copied()
            .collect()
    }

    /// Check if `pos` belongs to one of `player`'s standing mills.
    pub fn is_in_mill(&self, pos: Pos, player: Player) -> bool {
        self.occupant(pos) == Some(player) && self.is_mill(pos, player)
    }

    // ========== Highlights ==========

    /// Clear every highlight flag.
    pub fn clear_highlights(&mut self) {
        for node in &mut self.nodes {
            node.highlighted = false;
        }
    }

    /// Set the highlight flag of a position.
    #[inline]
    pub fn set_highlight(&mut self, pos: Pos, highlighted: bool) {
        if let Some(node) = self.nodes.get_mut(pos.0 as usize) {
            node.highlighted = highlighted;
        }
    }

    /// Currently highlighted positions.
    pub fn highlighted(&self) -> Vec<Pos> {
        self.nodes
            .iter()
            .filter(|node| node.highlighted)
            .map(|node| node.id)
            .collect()
    }

    // ========== Speculative Mutation ==========

    /// Start a scoped speculative mutation. Every occupant change made
    /// through the returned [`Trial`] is undone when it is dropped.
    #[inline]
    pub fn trial(&mut self) -> Trial<'_> {
        Trial {
            board: self,
            undo: Vec::with_capacity(2),
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped speculative mutation of a [`Board`].
///
/// Reads go through `Deref<Target = Board>`. Prior occupants are restored in
/// reverse order on drop, so no path out of the scope can leak a change.
pub struct Trial<'a> {
    board: &'a mut Board,
    undo: Vec<(Pos, Option<Player>)>,
}

impl Trial<'_> {
    /// Set an occupant, recording the previous one for restoration.
    pub fn set_occupant(&mut self, pos: Pos, occupant: Option<Player>) -> &mut Self {
        if pos.is_valid() {
            self.undo.push((pos, self.board.occupant(pos)));
            self.board.set_occupant(pos, occupant);
        }
        self
    }

    /// Put a `player` piece on `pos`.
    #[inline]
    pub fn place(&mut self, pos: Pos, player: Player) -> &mut Self {
        self.set_occupant(pos, Some(player))
    }

    /// Move whatever occupies `from` to `to`.
    pub fn slide(&mut self, from: Pos, to: Pos) -> &mut Self {
        let piece = self.board.occupant(from);
        self.set_occupant(from, None);
        self.set_occupant(to, piece)
    }
}

impl Deref for Trial<'_> {
    type Target = Board;

    fn deref(&self) -> &Board {
        &*self.board
    }
}

impl Drop for Trial<'_> {
    fn drop(&mut self) {
        while let Some((pos, previous)) = self.undo.pop() {
            self.board.set_occupant(pos, previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ids(positions: &[Pos]) -> Vec<u8> {
        positions.iter().map(|p| p.0).collect()
    }

    #[test]
    fn test_board_new() {
        let board = Board::new();
        assert_eq!(board.nodes().len(), NUM_POSITIONS);
        for (i, node) in board.nodes().iter().enumerate() {
            assert_eq!(node.id, Pos(i as u8));
            assert_eq!(node.occupant, None);
            assert!(!node.highlighted);
        }
        assert_eq!(board.empty_positions().len(), NUM_POSITIONS);
    }

    #[test]
    fn test_exact_adjacency() {
        let expected: [&[u8]; 24] = [
            &[7, 1, 8],
            &[0, 2],
            &[1, 3, 10],
            &[2, 4],
            &[3, 5, 12],
            &[4, 6],
            &[5, 7, 14],
            &[6, 0],
            &[15, 9, 0, 16],
            &[8, 10],
            &[9, 11, 2, 18],
            &[10, 12],
            &[11, 13, 4, 20],
            &[12, 14],
            &[13, 15, 6, 22],
            &[14, 8],
            &[23, 17, 8],
            &[16, 18],
            &[17, 19, 10],
            &[18, 20],
            &[19, 21, 12],
            &[20, 22],
            &[21, 23, 14],
            &[22, 16],
        ];

        let board = Board::new();
        for pos in Pos::all() {
            assert_eq!(
                ids(board.neighbors(pos)),
                expected[pos.0 as usize],
                "Adjacency mismatch at {}",
                pos
            );
        }
    }

    #[test]
    fn test_adjacency_symmetric() {
        let board = Board::new();
        for a in Pos::all() {
            for b in Pos::all() {
                assert_eq!(
                    board.can_move(a, b),
                    board.can_move(b, a),
                    "Asymmetric link between {} and {}",
                    a,
                    b
                );
            }
        }
        assert_eq!(board.validate_connections(), Ok(()));
    }

    #[test]
    fn test_degrees() {
        let board = Board::new();
        for pos in Pos::all() {
            let degree = board.neighbors(pos).len();
            let expected = match (pos.is_spoke(), pos.ring()) {
                (false, _) => 2,
                (true, 1) => 4,
                (true, _) => 3,
            };
            assert_eq!(degree, expected, "Degree mismatch at {}", pos);
        }
    }

    #[test]
    fn test_validate_detects_one_way_link() {
        let mut board = Board::new();
        board.nodes[1].neighbors.push(Pos(5));
        assert_eq!(
            board.validate_connections(),
            Err(MillError::OneWayConnection { from: Pos(1), to: Pos(5) })
        );
    }

    #[test]
    fn test_validate_detects_dangling_link() {
        let mut board = Board::new();
        board.nodes[3].neighbors.push(Pos(30));
        assert_eq!(
            board.validate_connections(),
            Err(MillError::DanglingConnection { from: Pos(3), to: Pos(30) })
        );
    }

    #[test]
    fn test_mill_line_integrity() {
        let board = Board::new();
        assert_eq!(board.mill_lines().len(), 16);

        let mut seen = HashSet::new();
        for line in board.mill_lines() {
            let set: Vec<u8> = {
                let mut v = ids(line);
                v.sort();
                v
            };
            assert!(line.iter().all(|p| p.is_valid()), "Invalid id in {:?}", line);
            assert_eq!(
                set.iter().collect::<HashSet<_>>().len(),
                3,
                "Line {:?} has duplicate ids",
                line
            );
            assert!(seen.insert(set), "Duplicate line {:?}", line);
        }
    }

    #[test]
    fn test_every_position_on_a_line() {
        let board = Board::new();
        for pos in Pos::all() {
            let lines = board.mill_lines_through(pos).count();
            let expected = if pos.is_spoke() { 3 } else { 1 };
            assert_eq!(lines, expected, "Line count mismatch at {}", pos);
        }
    }

    #[test]
    fn test_coordinates() {
        let board = Board::new();
        let (x, y) = board.node(0).unwrap().coord;
        assert!((x - 150.0).abs() < 1e-3 && y.abs() < 1e-3);
        let (x, y) = board.node(10).unwrap().coord;
        assert!(x.abs() < 1e-3 && (y - 100.0).abs() < 1e-3);
        let (x, y) = board.node(20).unwrap().coord;
        assert!((x + 50.0).abs() < 1e-3 && y.abs() < 1e-3);
    }

    #[test]
    fn test_node_lookup() {
        let board = Board::new();
        assert_eq!(board.node(23).map(|n| n.id), Some(Pos(23)));
        assert!(board.node(24).is_none());
        assert!(board.node(200).is_none());
    }

    #[test]
    fn test_is_mill() {
        let mut board = Board::new();
        board.set_occupant(Pos(0), Some(Player::One));
        board.set_occupant(Pos(1), Some(Player::One));
        assert!(!board.is_mill(Pos(1), Player::One));

        board.set_occupant(Pos(2), Some(Player::One));
        assert!(board.is_mill(Pos(1), Player::One));
        assert!(board.is_mill(Pos(0), Player::One));
        assert!(!board.is_mill(Pos(1), Player::Two));
        assert!(!board.is_mill(Pos(3), Player::One));
    }

    #[test]
    fn test_spoke_mill() {
        let mut board = Board::new();
        for id in [4, 12, 20] {
            board.set_occupant(Pos(id), Some(Player::Two));
        }
        assert!(board.is_mill(Pos(12), Player::Two));
        assert_eq!(board.all_mills(Player::Two), vec![[Pos(4), Pos(12), Pos(20)]]);
    }

    #[test]
    fn test_mixed_line_is_not_mill() {
        let mut board = Board::new();
        board.set_occupant(Pos(8), Some(Player::One));
        board.set_occupant(Pos(9), Some(Player::Two));
        board.set_occupant(Pos(10), Some(Player::One));
        assert!(!board.is_mill(Pos(8), Player::One));
        assert!(board.all_mills(Player::One).is_empty());
    }

    #[test]
    fn test_all_mills_multiple() {
        let mut board = Board::new();
        // Outer {0,1,2} and spoke {0,8,16} share position 0
        for id in [0, 1, 2, 8, 16] {
            board.set_occupant(Pos(id), Some(Player::One));
        }
        let mills = board.all_mills(Player::One);
        assert_eq!(mills.len(), 2);
        assert!(mills.contains(&[Pos(0), Pos(1), Pos(2)]));
        assert!(mills.contains(&[Pos(0), Pos(8), Pos(16)]));
        assert!(board.is_in_mill(Pos(8), Player::One));
        assert!(!board.is_in_mill(Pos(8), Player::Two));
    }

    #[test]
    fn test_legal_destinations() {
        let mut board = Board::new();
        assert_eq!(ids(&board.legal_destinations(Pos(8))), vec![15, 9, 0, 16]);

        board.set_occupant(Pos(9), Some(Player::Two));
        board.set_occupant(Pos(0), Some(Player::One));
        assert_eq!(ids(&board.legal_destinations(Pos(8))), vec![15, 16]);
        assert!(board.legal_destinations(Pos(99)).is_empty());
    }

    #[test]
    fn test_can_move_ignores_occupancy() {
        let mut board = Board::new();
        board.set_occupant(Pos(1), Some(Player::Two));
        assert!(board.can_move(Pos(0), Pos(1)));
        assert!(!board.can_move(Pos(0), Pos(2)));
        assert!(!board.can_move(Pos(1), Pos(9)));
    }

    #[test]
    fn test_pieces_and_count() {
        let mut board = Board::new();
        board.set_occupant(Pos(5), Some(Player::One));
        board.set_occupant(Pos(3), Some(Player::One));
        board.set_occupant(Pos(4), Some(Player::Two));
        assert_eq!(board.pieces(Player::One).collect::<Vec<_>>(), vec![Pos(3), Pos(5)]);
        assert_eq!(board.count(Player::Two), 1);
        assert_eq!(board.empty_positions().len(), 21);
    }

    #[test]
    fn test_highlights() {
        let mut board = Board::new();
        board.set_highlight(Pos(3), true);
        board.set_highlight(Pos(7), true);
        assert_eq!(board.highlighted(), vec![Pos(3), Pos(7)]);
        board.clear_highlights();
        assert!(board.highlighted().is_empty());
    }

    #[test]
    fn test_trial_reverts_on_drop() {
        let mut board = Board::new();
        board.set_occupant(Pos(0), Some(Player::One));
        let before = board.clone();

        {
            let mut trial = board.trial();
            trial.place(Pos(1), Player::One).place(Pos(2), Player::One);
            assert!(trial.is_mill(Pos(2), Player::One));
        }
        assert_eq!(board, before);
    }

    #[test]
    fn test_trial_slide_reverts() {
        let mut board = Board::new();
        board.set_occupant(Pos(1), Some(Player::Two));
        let before = board.clone();

        {
            let mut trial = board.trial();
            trial.slide(Pos(1), Pos(9));
            assert_eq!(trial.occupant(Pos(1)), None);
            assert_eq!(trial.occupant(Pos(9)), Some(Player::Two));
        }
        assert_eq!(board, before);
    }

    #[test]
    fn test_trial_reverts_on_early_return() {
        fn probe(board: &mut Board) -> bool {
            let mut trial = board.trial();
            trial.place(Pos(10), Player::Two);
            if trial.occupant(Pos(10)) == Some(Player::Two) {
                return true;
            }
            false
        }

        let mut board = Board::new();
        let before = board.clone();
        assert!(probe(&mut board));
        assert_eq!(board, before);
    }

    #[test]
    fn test_trial_overwrite_same_position() {
        let mut board = Board::new();
        board.set_occupant(Pos(4), Some(Player::One));
        let before = board.clone();
        {
            let mut trial = board.trial();
            trial.set_occupant(Pos(4), Some(Player::Two));
            trial.set_occupant(Pos(4), None);
            assert!(trial.is_empty(Pos(4)));
        }
        assert_eq!(board, before);
    }
}
