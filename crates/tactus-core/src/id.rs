use indexmap::IndexMap;

/// Unique identifier for a locatable AST node.
///
/// Ids are handed out by the parser front-end; the resolution passes address
/// nodes by id when reporting errors and never interpret the value itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn dummy() -> Self {
        Self(u32::MAX)
    }

    pub fn is_dummy(&self) -> bool {
        self.0 == u32::MAX
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Generator for fresh node ids, used by front-ends and tests.
#[derive(Debug, Default)]
pub struct NodeIdGen {
    next: u32,
}

impl NodeIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

/// A location in source text (line and column, 1-based)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Side table mapping node ids to source locations.
///
/// The error reporter resolves ids against this table; the engine itself
/// only ever forwards ids.
#[derive(Debug, Default)]
pub struct LocationMap {
    locations: IndexMap<NodeId, Location>,
}

impl LocationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: NodeId, location: Location) {
        self.locations.insert(id, location);
    }

    pub fn get(&self, id: NodeId) -> Option<Location> {
        self.locations.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Location)> + '_ {
        self.locations.iter().map(|(id, loc)| (*id, *loc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_gen_is_sequential() {
        let mut gen = NodeIdGen::new();
        let a = gen.fresh();
        let b = gen.fresh();
        assert_ne!(a, b);
        assert_eq!(a.index() + 1, b.index());
    }

    #[test]
    fn test_location_map() {
        let mut gen = NodeIdGen::new();
        let mut map = LocationMap::new();
        let id = gen.fresh();
        map.insert(id, Location::new(2, 7));

        assert_eq!(map.get(id), Some(Location::new(2, 7)));
        assert_eq!(map.get(NodeId::dummy()), None);
        assert_eq!(map.len(), 1);
    }
}
