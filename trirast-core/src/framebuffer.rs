/// Colour and depth surfaces the rasterization kernel draws into.
use thiserror::Error;

/// Bytes per colour pixel (RGBA, 8 bits per channel).
pub const COLOR_BYTES: usize = 4;
/// Bytes per depth sample.
pub const DEPTH_BYTES: usize = 2;

pub type DepthSample = u16;

#[derive(Debug, Error)]
pub enum FramebufferError {
    #[error("failed to allocate {bytes} bytes for a {width}x{height} framebuffer")]
    Allocation { width: u32, height: u32, bytes: usize },
}

/// Colour plus depth buffer sized for one output resolution.
///
/// Both buffers always hold exactly `width * height` pixels; both are empty
/// until the first successful [`Framebuffer::resize`]. Content after a resize
/// is unspecified and is expected to be fully rewritten by the kernel.
#[derive(Debug, Default)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    color: Vec<u8>,
    depth: Vec<DepthSample>,
}

impl Framebuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_allocated(&self) -> bool {
        !self.color.is_empty()
    }

    /// Reallocates both buffers for a new resolution.
    ///
    /// Non-positive dimensions and the current dimensions are ignored and
    /// return `Ok(false)`. Otherwise the old buffers are released before the
    /// new ones are allocated, and `Ok(true)` is returned. Every slice obtained
    /// earlier is invalid afterwards.
    pub fn resize(&mut self, width: i32, height: i32) -> Result<bool, FramebufferError> {
        if width <= 0 || height <= 0 {
            return Ok(false);
        }
        let (width, height) = (width as u32, height as u32);
        if width == self.width && height == self.height {
            return Ok(false);
        }

        self.color = Vec::new();
        self.depth = Vec::new();
        self.width = 0;
        self.height = 0;

        let pixels = width as usize * height as usize;
        let failed = || FramebufferError::Allocation {
            width,
            height,
            bytes: pixels * (COLOR_BYTES + DEPTH_BYTES),
        };
        let mut color = Vec::new();
        color.try_reserve_exact(pixels * COLOR_BYTES).map_err(|_| failed())?;
        color.resize(pixels * COLOR_BYTES, 0);
        let mut depth = Vec::new();
        depth.try_reserve_exact(pixels).map_err(|_| failed())?;
        depth.resize(pixels, 0);

        self.color = color;
        self.depth = depth;
        self.width = width;
        self.height = height;
        tracing::info!(width, height, "framebuffer reallocated");
        Ok(true)
    }

    /// Size of the colour buffer: `width * height * 4`.
    pub fn color_size_in_bytes(&self) -> usize {
        self.width as usize * self.height as usize * COLOR_BYTES
    }

    /// Size of the depth buffer: `width * height * 2`.
    pub fn depth_size_in_bytes(&self) -> usize {
        self.width as usize * self.height as usize * DEPTH_BYTES
    }

    /// Tightly packed RGBA rows.
    pub fn color(&self) -> &[u8] {
        &self.color
    }

    pub fn depth(&self) -> &[DepthSample] {
        &self.depth
    }

    /// Both surfaces at once, for handing to the kernel.
    pub fn surfaces_mut(&mut self) -> (&mut [u8], &mut [DepthSample]) {
        (&mut self.color, &mut self.depth)
    }
}
