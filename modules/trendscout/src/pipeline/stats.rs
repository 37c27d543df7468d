/// Counters from one collection run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub locations_requested: u32,
    pub locations_resolved: u32,
    pub regions_failed: u32,
    pub hashtags_found: u32,
    pub hashtags_failed: u32,
    pub posts_written: u32,
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Trend Run Complete ===")?;
        writeln!(f, "Locations requested: {}", self.locations_requested)?;
        writeln!(f, "Locations resolved:  {}", self.locations_resolved)?;
        writeln!(f, "Regions failed:      {}", self.regions_failed)?;
        writeln!(f, "Hashtags found:      {}", self.hashtags_found)?;
        writeln!(f, "Hashtags failed:     {}", self.hashtags_failed)?;
        write!(f, "Posts written:       {}", self.posts_written)
    }
}
