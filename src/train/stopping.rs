/// Decides after each epoch whether training should end.
pub trait StoppingAdvisor: Send {
    fn should_stop(&mut self, epoch: usize, score: f64) -> bool;
}

/// Stops once `epoch >= max_epochs`.
#[derive(Debug, Clone, Copy)]
pub struct MaxEpoch {
    pub max_epochs: usize,
}

impl MaxEpoch {
    pub fn new(max_epochs: usize) -> MaxEpoch {
        MaxEpoch { max_epochs }
    }
}

impl StoppingAdvisor for MaxEpoch {
    fn should_stop(&mut self, epoch: usize, _score: f64) -> bool {
        epoch >= self.max_epochs
    }
}

/// Stops `patience` epochs after the last score that beat the best by more
/// than `min_delta`.
#[derive(Debug, Clone, Copy)]
pub struct Patience {
    pub patience: usize,
    pub min_delta: f64,
    best_score: f64,
    best_epoch: usize,
}

impl Patience {
    pub fn new(patience: usize, min_delta: f64) -> Patience {
        Patience { patience, min_delta, best_score: f64::NEG_INFINITY, best_epoch: 0 }
    }

    pub fn best_epoch(&self) -> usize {
        self.best_epoch
    }
}

impl StoppingAdvisor for Patience {
    fn should_stop(&mut self, epoch: usize, score: f64) -> bool {
        if score > self.best_score + self.min_delta {
            self.best_score = score;
            self.best_epoch = epoch;
        }
        epoch.saturating_sub(self.best_epoch) >= self.patience
    }
}

/// Stops as soon as the score reaches `threshold`.
#[derive(Debug, Clone, Copy)]
pub struct ScoreThreshold {
    pub threshold: f64,
}

impl ScoreThreshold {
    pub fn new(threshold: f64) -> ScoreThreshold {
        ScoreThreshold { threshold }
    }
}

impl StoppingAdvisor for ScoreThreshold {
    fn should_stop(&mut self, _epoch: usize, score: f64) -> bool {
        score >= self.threshold
    }
}

/// Stops when any member says so. Every member sees every epoch, so
/// stateful advisors stay current even after another one fires.
#[derive(Default)]
pub struct Composite {
    advisors: Vec<Box<dyn StoppingAdvisor>>,
}

impl Composite {
    pub fn new(advisors: Vec<Box<dyn StoppingAdvisor>>) -> Composite {
        Composite { advisors }
    }

    pub fn with(mut self, advisor: impl StoppingAdvisor + 'static) -> Composite {
        self.advisors.push(Box::new(advisor));
        self
    }
}

impl StoppingAdvisor for Composite {
    fn should_stop(&mut self, epoch: usize, score: f64) -> bool {
        self.advisors
            .iter_mut()
            .map(|a| a.should_stop(epoch, score))
            .fold(false, |stop, s| stop || s)
    }
}
