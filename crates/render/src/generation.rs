use cityscape_citygen::City;

/// One installed city, tagged with the ticket that produced it.
///
/// Generations are immutable and shared by `Arc`; replacing the current one
/// is a single pointer swap at a frame boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct CityGeneration {
    id: u64,
    city: City,
}

impl CityGeneration {
    pub fn new(id: u64, city: City) -> Self {
        Self { id, city }
    }

    /// Monotonic ticket; later requests always carry a larger id.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn city(&self) -> &City {
        &self.city
    }
}
