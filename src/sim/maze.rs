//! Maze generation
//!
//! Randomized depth-first backtracking over odd-coordinate rooms produces a perfect maze.
//! A braiding pass then knocks out some dead ends, and at most one mechanic overlay is
//! applied on top. Placement loops are bounded; when a ceiling is hit the overlay places
//! fewer features and reports a [`Shortfall`] instead of failing.

use std::collections::VecDeque;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};

use super::input::Direction;

/// Smallest maze that still has more than one room
pub const MIN_SIZE: usize = 5;
/// Largest accepted maze
pub const MAX_SIZE: usize = 101;

/// Grid cell code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Path,
    Wall,
    Start,
    Goal,
    /// Passable, drawn exactly like a wall
    IllusionWall,
    /// Entering may cost the next move
    SlowTile,
    Coin,
    /// Impassable until enough coins are collected
    LockedGate,
    PortalA,
    PortalB,
}

impl Cell {
    /// Whether an actor may step onto this cell
    pub fn is_open(self) -> bool {
        !matches!(self, Cell::Wall | Cell::LockedGate)
    }

    /// Whether the renderer should draw a wall here
    pub fn looks_solid(self) -> bool {
        matches!(self, Cell::Wall | Cell::IllusionWall)
    }
}

/// Integer grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Direction) -> Pos {
        let (dx, dy) = dir.delta();
        Pos::new(self.x + dx, self.y + dy)
    }

    pub fn manhattan(self, other: Pos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Neighbours in [`Direction::ALL`] order
    pub fn neighbors(self) -> [Pos; 4] {
        Direction::ALL.map(|d| self.step(d))
    }

    /// Direction of a unit step from `self` to `other`, if they are adjacent
    pub fn direction_to(self, other: Pos) -> Option<Direction> {
        Direction::ALL.into_iter().find(|d| self.step(*d) == other)
    }
}

/// Square grid of cells. Reads outside the grid are walls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    size: i32,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn filled(size: usize, cell: Cell) -> Self {
        let size = size.min(MAX_SIZE);
        Self {
            size: size as i32,
            cells: vec![cell; size * size],
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn in_bounds(&self, p: Pos) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.size && p.y < self.size
    }

    /// Outer ring
    pub fn is_border(&self, p: Pos) -> bool {
        p.x == 0 || p.y == 0 || p.x == self.size - 1 || p.y == self.size - 1
    }

    fn index(&self, p: Pos) -> Option<usize> {
        self.in_bounds(p)
            .then(|| (p.y * self.size + p.x) as usize)
    }

    pub fn get(&self, p: Pos) -> Cell {
        self.index(p).map_or(Cell::Wall, |i| self.cells[i])
    }

    pub fn set(&mut self, p: Pos, cell: Cell) {
        if let Some(i) = self.index(p) {
            self.cells[i] = cell;
        }
    }

    /// Every coordinate in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Pos> + use<> {
        let size = self.size;
        (0..size).flat_map(move |y| (0..size).map(move |x| Pos::new(x, y)))
    }

    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|c| **c == cell).count()
    }

    pub fn find(&self, cell: Cell) -> Option<Pos> {
        self.positions().find(|p| self.get(*p) == cell)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.size.max(1) as usize)
    }

    /// Number of structural wall neighbours
    fn wall_neighbors(&self, p: Pos) -> usize {
        p.neighbors()
            .iter()
            .filter(|n| self.get(**n) == Cell::Wall)
            .count()
    }
}

/// Overlay applied on top of the carved maze
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Mechanic {
    #[default]
    None,
    Illusion,
    Slow,
    CoinGate,
    Portal,
}

/// Difficulty knobs for one maze
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MazeParams {
    /// Chance each dead end gets a wall knocked out
    pub braid_factor: f32,
    /// Share of path-adjacent walls turned into illusions
    pub illusion_ratio: f32,
    /// Share of path cells turned into slow tiles
    pub slow_ratio: f32,
    /// Chance that entering a slow tile costs the next move
    pub slow_skip_chance: f32,
    /// Coins requested for a coin gate
    pub coin_count: usize,
    /// Minimum Manhattan distance of a coin from both start and goal
    pub coin_min_distance: i32,
    /// Attempt ceiling for each random placement
    pub placement_attempts: u32,
}

impl Default for MazeParams {
    fn default() -> Self {
        Self {
            braid_factor: 0.1,
            illusion_ratio: 0.15,
            slow_ratio: 0.2,
            slow_skip_chance: 0.5,
            coin_count: 5,
            coin_min_distance: 4,
            placement_attempts: 200,
        }
    }
}

/// A feature that could not be fully placed within its attempt budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shortfall {
    pub feature: String,
    pub requested: usize,
    pub placed: usize,
}

/// Generated level with the bookkeeping its mechanic needs
#[derive(Debug, Clone)]
pub struct GeneratedMaze {
    pub grid: Grid,
    pub start: Pos,
    pub goal: Pos,
    pub mechanic: Mechanic,
    /// Coins the actor must hold before the gate opens
    pub coins_required: u32,
    pub gate: Option<Pos>,
    pub portals: Option<(Pos, Pos)>,
    pub shortfalls: Vec<Shortfall>,
}

/// Start cell of every maze
pub const START: Pos = Pos::new(1, 1);

/// Force a requested size into an odd value within bounds
pub fn normalize_size(size: usize) -> usize {
    let size = size.clamp(MIN_SIZE, MAX_SIZE);
    if size % 2 == 0 { size - 1 } else { size }
}

/// Generate a complete maze: carve, braid, place start/goal, apply the mechanic.
pub fn generate<R: Rng + ?Sized>(
    size: usize,
    mechanic: Mechanic,
    params: &MazeParams,
    rng: &mut R,
) -> GeneratedMaze {
    let mut grid = carve_perfect(size, rng);
    let braided = braid(&mut grid, params.braid_factor, rng);
    log::debug!("Braided {} dead ends", braided);

    let goal = place_goal(&mut grid);
    grid.set(START, Cell::Start);

    let mut maze = GeneratedMaze {
        grid,
        start: START,
        goal,
        mechanic,
        coins_required: 0,
        gate: None,
        portals: None,
        shortfalls: Vec::new(),
    };

    match mechanic {
        Mechanic::None => {}
        Mechanic::Illusion => overlay_illusion(&mut maze.grid, params.illusion_ratio, rng),
        Mechanic::Slow => overlay_slow(&mut maze.grid, params.slow_ratio, rng),
        Mechanic::CoinGate => overlay_coin_gate(&mut maze, params, rng),
        Mechanic::Portal => overlay_portals(&mut maze, params, rng),
    }

    for s in &maze.shortfalls {
        log::warn!(
            "Maze {:?}: placed {} of {} {}",
            mechanic,
            s.placed,
            s.requested,
            s.feature
        );
    }
    maze
}

/// Perfect maze by iterative backtracking. Start room is (1, 1).
pub fn carve_perfect<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Grid {
    let mut grid = Grid::filled(normalize_size(size), Cell::Wall);
    let last = grid.size() - 2;
    grid.set(START, Cell::Path);

    let mut stack = vec![START];
    while let Some(&cur) = stack.last() {
        let options: Vec<(Pos, Pos)> = Direction::ALL
            .iter()
            .filter_map(|d| {
                let (dx, dy) = d.delta();
                let next = Pos::new(cur.x + 2 * dx, cur.y + 2 * dy);
                let inside = next.x >= 1 && next.y >= 1 && next.x <= last && next.y <= last;
                (inside && grid.get(next) == Cell::Wall)
                    .then_some((Pos::new(cur.x + dx, cur.y + dy), next))
            })
            .collect();

        let Some(&(between, next)) = options.choose(rng) else {
            stack.pop();
            continue;
        };
        grid.set(between, Cell::Path);
        grid.set(next, Cell::Path);
        stack.push(next);
    }
    grid
}

/// Open cells with exactly three wall neighbours
pub fn dead_ends(grid: &Grid) -> Vec<Pos> {
    grid.positions()
        .filter(|p| grid.get(*p) != Cell::Wall && grid.wall_neighbors(*p) == 3)
        .collect()
}

/// Knock one wall out of each dead end with probability `factor`. Returns walls removed.
///
/// Candidates are taken once up front; a candidate that stopped being a dead end because of
/// an earlier knock-out is skipped. The outer ring is never opened.
pub fn braid<R: Rng + ?Sized>(grid: &mut Grid, factor: f32, rng: &mut R) -> usize {
    let factor = if factor.is_nan() { 0.0 } else { factor.clamp(0.0, 1.0) };
    let mut removed = 0;
    for cell in dead_ends(grid) {
        let roll: f32 = rng.random();
        if roll >= factor || grid.wall_neighbors(cell) != 3 {
            continue;
        }
        let walls: Vec<Pos> = cell
            .neighbors()
            .into_iter()
            .filter(|n| !grid.is_border(*n) && grid.get(*n) == Cell::Wall)
            .collect();
        if let Some(&wall) = walls.choose(rng) {
            grid.set(wall, Cell::Path);
            removed += 1;
        }
    }
    removed
}

/// Scan inward from the bottom-right corner for the first open cell and mark it GOAL.
pub fn place_goal(grid: &mut Grid) -> Pos {
    let last = grid.size() - 2;
    let found = (1..=last)
        .rev()
        .flat_map(|y| (1..=last).rev().map(move |x| Pos::new(x, y)))
        .find(|p| *p != START && grid.get(*p) == Cell::Path);
    // A carved maze always has a room at (last, last)
    let goal = found.unwrap_or(Pos::new(last, last));
    grid.set(goal, Cell::Goal);
    goal
}

/// Breadth-first reachability mask from `from`
fn flood(grid: &Grid, from: Pos, passable: impl Fn(Cell) -> bool) -> Vec<bool> {
    let size = grid.size();
    let mut seen = vec![false; (size * size) as usize];
    let Some(start) = grid.index(from) else {
        return seen;
    };
    seen[start] = true;
    let mut queue = VecDeque::from([from]);
    while let Some(cur) = queue.pop_front() {
        for n in cur.neighbors() {
            if let Some(i) = grid.index(n) {
                if !seen[i] && passable(grid.get(n)) {
                    seen[i] = true;
                    queue.push_back(n);
                }
            }
        }
    }
    seen
}

/// Whether every cell accepted by `passable` can be reached from `from`
pub fn all_reachable(grid: &Grid, from: Pos, passable: impl Fn(Cell) -> bool + Copy) -> bool {
    let seen = flood(grid, from, passable);
    grid.positions()
        .all(|p| !passable(grid.get(p)) || grid.index(p).is_some_and(|i| seen[i]))
}

/// Shortest path from `from` to `to`, both included
pub fn shortest_path(
    grid: &Grid,
    from: Pos,
    to: Pos,
    passable: impl Fn(Cell) -> bool,
) -> Option<Vec<Pos>> {
    let size = grid.size();
    let start = grid.index(from)?;
    let mut parent: Vec<Option<Pos>> = vec![None; (size * size) as usize];
    let mut seen = vec![false; (size * size) as usize];
    seen[start] = true;
    let mut queue = VecDeque::from([from]);

    while let Some(cur) = queue.pop_front() {
        if cur == to {
            let mut path = vec![cur];
            let mut at = cur;
            while let Some(prev) = grid.index(at).and_then(|i| parent[i]) {
                path.push(prev);
                at = prev;
            }
            path.reverse();
            return Some(path);
        }
        for n in cur.neighbors() {
            if let Some(i) = grid.index(n) {
                if !seen[i] && passable(grid.get(n)) {
                    seen[i] = true;
                    parent[i] = Some(cur);
                    queue.push_back(n);
                }
            }
        }
    }
    None
}

/// Open walls until every open cell (goal and gate excepted) is reachable from `from`
/// without crossing the gate. Walls touching the goal stay closed.
fn reconnect(grid: &mut Grid, from: Pos, goal: Pos) {
    let passable = |c: Cell| c.is_open() && c != Cell::Goal;
    for _ in 0..grid.cells.len() {
        let seen = flood(grid, from, passable);
        let reached = |g: &Grid, p: Pos| g.index(p).is_some_and(|i| seen[i]);
        let stranded = |g: &Grid, p: Pos| passable(g.get(p)) && !reached(g, p);

        if !grid.positions().any(|p| stranded(grid, p)) {
            return;
        }
        let bridge = grid.positions().find(|w| {
            grid.get(*w) == Cell::Wall
                && !grid.is_border(*w)
                && w.manhattan(goal) > 1
                && w.neighbors().iter().any(|n| reached(grid, *n))
                && w.neighbors().iter().any(|n| stranded(grid, *n))
        });
        match bridge {
            Some(w) => grid.set(w, Cell::Path),
            None => {
                log::warn!("Maze reconnect found no bridge");
                return;
            }
        }
    }
}

fn overlay_illusion<R: Rng + ?Sized>(grid: &mut Grid, ratio: f32, rng: &mut R) {
    let mut candidates: Vec<Pos> = grid
        .positions()
        .filter(|p| {
            grid.get(*p) == Cell::Wall
                && !grid.is_border(*p)
                && p.neighbors().iter().any(|n| grid.get(*n).is_open())
        })
        .collect();
    candidates.shuffle(rng);
    let take = share(candidates.len(), ratio);
    for p in candidates.into_iter().take(take) {
        grid.set(p, Cell::IllusionWall);
    }
}

fn overlay_slow<R: Rng + ?Sized>(grid: &mut Grid, ratio: f32, rng: &mut R) {
    let mut candidates: Vec<Pos> = grid
        .positions()
        .filter(|p| grid.get(*p) == Cell::Path)
        .collect();
    candidates.shuffle(rng);
    let take = share(candidates.len(), ratio);
    for p in candidates.into_iter().take(take) {
        grid.set(p, Cell::SlowTile);
    }
}

fn overlay_coin_gate<R: Rng + ?Sized>(maze: &mut GeneratedMaze, params: &MazeParams, rng: &mut R) {
    let grid = &mut maze.grid;
    let goal = maze.goal;

    // The gate sits on the goal's side of the shortest route; every other way in is closed
    let route = shortest_path(grid, maze.start, goal, Cell::is_open);
    let gate = route
        .as_ref()
        .and_then(|r| r.len().checked_sub(2).map(|i| r[i]))
        .unwrap_or_else(|| {
            goal.neighbors()
                .into_iter()
                .find(|n| !grid.is_border(*n))
                .unwrap_or(goal)
        });
    for n in goal.neighbors() {
        if n != gate && grid.get(n).is_open() {
            grid.set(n, Cell::Wall);
        }
    }
    grid.set(gate, Cell::LockedGate);
    reconnect(grid, maze.start, goal);
    maze.gate = Some(gate);

    let wanted = params.coin_count;
    let mut placed = 0;
    let mut attempts = 0;
    let last = grid.size() - 2;
    while placed < wanted && attempts < params.placement_attempts {
        attempts += 1;
        let p = Pos::new(rng.random_range(1..=last), rng.random_range(1..=last));
        if grid.get(p) == Cell::Path
            && p.manhattan(maze.start) >= params.coin_min_distance
            && p.manhattan(goal) >= params.coin_min_distance
        {
            grid.set(p, Cell::Coin);
            placed += 1;
        }
    }
    if placed < wanted {
        maze.shortfalls.push(Shortfall {
            feature: "coins".to_string(),
            requested: wanted,
            placed,
        });
    }
    maze.coins_required = placed as u32;
}

fn overlay_portals<R: Rng + ?Sized>(maze: &mut GeneratedMaze, params: &MazeParams, rng: &mut R) {
    let grid = &mut maze.grid;
    let size = grid.size();
    let half = size / 2;
    let last = size - 2;

    let mut pick = |xs: std::ops::RangeInclusive<i32>, grid: &Grid| {
        (0..params.placement_attempts).find_map(|_| {
            let p = Pos::new(rng.random_range(xs.clone()), rng.random_range(1..=last));
            (grid.get(p) == Cell::Path).then_some(p)
        })
    };
    let a = pick(1..=half - 1, &*grid);
    let b = pick(half + 1..=last, &*grid);

    match (a, b) {
        (Some(a), Some(b)) => {
            grid.set(a, Cell::PortalA);
            grid.set(b, Cell::PortalB);
            maze.portals = Some((a, b));
        }
        // Portals only exist in pairs, a lone one is dropped
        _ => maze.shortfalls.push(Shortfall {
            feature: "portals".to_string(),
            requested: 2,
            placed: 0,
        }),
    }
}

fn share(len: usize, ratio: f32) -> usize {
    let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
    ((len as f32) * ratio).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn passable_with_gate(c: Cell) -> bool {
        c != Cell::Wall
    }

    fn mechanic_strategy() -> impl Strategy<Value = Mechanic> {
        prop_oneof![
            Just(Mechanic::None),
            Just(Mechanic::Illusion),
            Just(Mechanic::Slow),
            Just(Mechanic::CoinGate),
            Just(Mechanic::Portal),
        ]
    }

    #[test]
    fn test_size_normalization() {
        assert_eq!(normalize_size(0), 5);
        assert_eq!(normalize_size(14), 13);
        assert_eq!(normalize_size(15), 15);
        assert_eq!(normalize_size(1000), 101);
    }

    #[test]
    fn test_perfect_maze_is_a_tree() {
        let mut rng = Pcg32::seed_from_u64(7);
        let grid = carve_perfect(15, &mut rng);
        let open = grid.positions().filter(|p| grid.get(*p) != Cell::Wall).count();
        // Count undirected edges between open cells; a spanning tree has open - 1
        let edges: usize = grid
            .positions()
            .filter(|p| grid.get(*p) != Cell::Wall)
            .map(|p| {
                [Direction::Right, Direction::Down]
                    .iter()
                    .filter(|d| grid.get(p.step(**d)) != Cell::Wall)
                    .count()
            })
            .sum();
        assert_eq!(edges, open - 1);
        // Every room is carved
        assert_eq!(open, 7 * 7 + (7 * 7 - 1));
    }

    #[test]
    fn test_outer_ring_is_wall() {
        let mut rng = Pcg32::seed_from_u64(3);
        let maze = generate(15, Mechanic::Illusion, &MazeParams::default(), &mut rng);
        for p in maze.grid.positions().filter(|p| maze.grid.is_border(*p)) {
            assert_eq!(maze.grid.get(p), Cell::Wall);
        }
    }

    #[test]
    fn test_goal_scans_from_bottom_right() {
        let mut rng = Pcg32::seed_from_u64(11);
        let maze = generate(15, Mechanic::None, &MazeParams::default(), &mut rng);
        assert_eq!(maze.goal, Pos::new(13, 13));
        assert_eq!(maze.grid.count(Cell::Goal), 1);
        assert_eq!(maze.grid.count(Cell::Start), 1);
        assert_eq!(maze.grid.get(START), Cell::Start);
    }

    #[test]
    fn test_full_braid_removes_every_dead_end() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut grid = carve_perfect(21, &mut rng);
        assert!(!dead_ends(&grid).is_empty());
        braid(&mut grid, 1.0, &mut rng);
        assert!(dead_ends(&grid).is_empty());
    }

    #[test]
    fn test_zero_braid_leaves_maze_untouched() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut grid = carve_perfect(15, &mut rng);
        let before = grid.clone();
        assert_eq!(braid(&mut grid, 0.0, &mut rng), 0);
        assert_eq!(grid, before);
    }

    #[test]
    fn test_coin_gate_places_requested_coins() {
        let mut rng = Pcg32::seed_from_u64(42);
        let params = MazeParams {
            braid_factor: 0.7,
            ..Default::default()
        };
        let maze = generate(15, Mechanic::CoinGate, &params, &mut rng);
        assert_eq!(maze.grid.count(Cell::Coin), 5);
        assert_eq!(maze.coins_required, 5);
        assert_eq!(maze.grid.count(Cell::LockedGate), 1);
        let gate = maze.gate.unwrap();
        assert_eq!(gate.manhattan(maze.goal), 1);
        assert!(maze.shortfalls.is_empty());
    }

    #[test]
    fn test_coin_shortfall_degrades() {
        let mut rng = Pcg32::seed_from_u64(42);
        let params = MazeParams {
            coin_count: 5,
            placement_attempts: 0,
            ..Default::default()
        };
        let maze = generate(15, Mechanic::CoinGate, &params, &mut rng);
        assert_eq!(maze.coins_required, 0);
        assert_eq!(
            maze.shortfalls,
            vec![Shortfall {
                feature: "coins".to_string(),
                requested: 5,
                placed: 0
            }]
        );
    }

    #[test]
    fn test_portals_in_disjoint_halves() {
        let mut rng = Pcg32::seed_from_u64(9);
        let maze = generate(15, Mechanic::Portal, &MazeParams::default(), &mut rng);
        let (a, b) = maze.portals.unwrap();
        assert!(a.x < 7 && b.x > 7);
        assert_eq!(maze.grid.get(a), Cell::PortalA);
        assert_eq!(maze.grid.get(b), Cell::PortalB);
    }

    #[test]
    fn test_slow_and_illusion_ratios() {
        let mut rng = Pcg32::seed_from_u64(1);
        let maze = generate(15, Mechanic::Slow, &MazeParams::default(), &mut rng);
        let slow = maze.grid.count(Cell::SlowTile);
        let path = maze.grid.count(Cell::Path);
        assert_eq!(slow, (((slow + path) as f32) * 0.2).round() as usize);

        let maze = generate(15, Mechanic::Illusion, &MazeParams::default(), &mut rng);
        assert!(maze.grid.count(Cell::IllusionWall) > 0);
    }

    #[test]
    fn test_shortest_path_endpoints() {
        let mut rng = Pcg32::seed_from_u64(2);
        let maze = generate(15, Mechanic::None, &MazeParams::default(), &mut rng);
        let path = shortest_path(&maze.grid, maze.start, maze.goal, Cell::is_open).unwrap();
        assert_eq!(path.first(), Some(&maze.start));
        assert_eq!(path.last(), Some(&maze.goal));
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan(pair[1]), 1);
        }
    }

    proptest! {
        #[test]
        fn test_goal_always_reachable(
            seed in any::<u64>(),
            size in 5usize..31,
            mechanic in mechanic_strategy(),
            braid_factor in 0.0f32..1.0,
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let params = MazeParams { braid_factor, ..Default::default() };
            let maze = generate(size, mechanic, &params, &mut rng);
            prop_assert!(shortest_path(&maze.grid, maze.start, maze.goal, passable_with_gate).is_some());
            prop_assert!(all_reachable(&maze.grid, maze.start, passable_with_gate));
        }

        #[test]
        fn test_braiding_never_adds_dead_ends(seed in any::<u64>(), size in 5usize..31, factor in 0.0f32..1.0) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let perfect = carve_perfect(size, &mut rng);
            let mut braided = perfect.clone();
            braid(&mut braided, factor, &mut rng);
            prop_assert!(dead_ends(&braided).len() <= dead_ends(&perfect).len());
        }

        #[test]
        fn test_gate_seals_goal(seed in any::<u64>(), size in 7usize..31, braid_factor in 0.0f32..1.0) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let params = MazeParams { braid_factor, ..Default::default() };
            let maze = generate(size, Mechanic::CoinGate, &params, &mut rng);
            // Locked gate blocks the only way in
            prop_assert!(shortest_path(&maze.grid, maze.start, maze.goal, Cell::is_open).is_none());
            // Every coin is collectable before the gate opens
            let seen = flood(&maze.grid, maze.start, |c| c.is_open() && c != Cell::Goal);
            for p in maze.grid.positions().filter(|p| maze.grid.get(*p) == Cell::Coin) {
                prop_assert!(seen[maze.grid.index(p).unwrap()]);
            }
        }
    }
}
