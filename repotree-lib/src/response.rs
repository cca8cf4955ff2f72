//! Response wrapper with cache status

/// A tree load result that records whether it came from the cache.
///
/// # Example
///
/// ```ignore
/// if let Some(response) = tree.load_children("src").await {
///     if response.is_cached() {
///         println!("no request was made");
///     }
///     let children = response.into_inner();
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    data: T,
    /// Information about whether this response came from cache.
    pub cache: CacheStatus,
}

impl<T> Response<T> {
    /// Creates a new response with no cache involvement.
    pub fn new(data: T) -> Self {
        Self::with_status(data, CacheStatus::None)
    }

    /// Creates a new response with the given cache status.
    pub fn with_status(data: T, cache: CacheStatus) -> Self {
        Self { data, cache }
    }

    /// Returns `true` if the data was already cached when requested.
    pub fn is_cached(&self) -> bool {
        self.cache.is_hit()
    }

    /// Returns `true` if this call caused the underlying request.
    pub fn is_fresh(&self) -> bool {
        matches!(self.cache, CacheStatus::None | CacheStatus::Miss)
    }

    /// Returns a reference to the inner data.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Consumes the response and returns the inner data.
    pub fn into_inner(self) -> T {
        self.data
    }
}

/// Cache status for a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// The cache was bypassed for this request.
    None,
    /// Cache miss: this call issued the request and cached the result.
    Miss,
    /// Another caller's request was already in flight; this call waited for it.
    Joined,
    /// Cache hit: no request was made.
    Hit,
}

impl CacheStatus {
    /// Returns `true` if this is a cache hit.
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit)
    }

    /// Returns `true` if this is a cache miss.
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }

    /// Returns `true` if this call piggybacked on an in-flight request.
    pub fn is_joined(&self) -> bool {
        matches!(self, Self::Joined)
    }
}
