/// Flag per pixel, set once a neighborhood has been claimed by a marker.
pub struct VerifiedMask {
    width: u32,
    height: u32,
    flags: Vec<bool>,
}

impl VerifiedMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            flags: vec![false; width as usize * height as usize],
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.flags[self.index(x, y)]
    }

    /// Marks the square of the given radius around `(cx, cy)`, clipped to the image.
    pub fn mark_square(&mut self, cx: u32, cy: u32, radius: u32) {
        let x0 = cx.saturating_sub(radius);
        let y0 = cy.saturating_sub(radius);
        let x1 = cx.saturating_add(radius).min(self.width.saturating_sub(1));
        let y1 = cy.saturating_add(radius).min(self.height.saturating_sub(1));

        for y in y0..=y1 {
            for x in x0..=x1 {
                let idx = self.index(x, y);
                self.flags[idx] = true;
            }
        }
    }
}
