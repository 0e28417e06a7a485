use anyhow::{bail, Result};
use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        loss::CrossEntropyLossConfig,
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
        PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::relu,
};

// #[derive(Config)] supplies Clone and the serde impls.
#[derive(Config, Debug)]
pub struct ClassifierConfig {
    pub num_classes: usize,
    pub height:      usize,
    pub width:       usize,
    #[config(default = 32)]
    pub conv1_channels: usize,
    #[config(default = 64)]
    pub conv2_channels: usize,
    /// Square kernel side; must be odd for same padding
    #[config(default = 5)]
    pub kernel_size: usize,
    #[config(default = 1024)]
    pub hidden_size: usize,
    #[config(default = 0.5)]
    pub dropout: f64,
}

impl ClassifierConfig {
    /// Reject shapes the network cannot be built for.
    pub fn validate(&self) -> Result<()> {
        if self.num_classes == 0 {
            bail!("num_classes must be positive");
        }
        if self.height < 4 || self.width < 4 {
            bail!(
                "images must be at least 4x4 to survive two 2x2 poolings, got {}x{}",
                self.width, self.height
            );
        }
        if self.kernel_size % 2 == 0 {
            bail!("kernel_size must be odd, got {}", self.kernel_size);
        }
        if self.conv1_channels == 0 || self.conv2_channels == 0 || self.hidden_size == 0 {
            bail!("layer widths must be positive");
        }
        if !(0.0..1.0).contains(&self.dropout) {
            bail!("dropout must be in [0, 1), got {}", self.dropout);
        }
        Ok(())
    }

    /// True when weights saved for `other` load into this network.
    /// Dropout has no parameters and is ignored.
    pub fn same_architecture(&self, other: &ClassifierConfig) -> bool {
        self.num_classes == other.num_classes
            && self.height == other.height
            && self.width == other.width
            && self.conv1_channels == other.conv1_channels
            && self.conv2_channels == other.conv2_channels
            && self.kernel_size == other.kernel_size
            && self.hidden_size == other.hidden_size
    }

    /// Features entering the first dense layer after both poolings.
    pub fn flat_dim(&self) -> usize {
        self.conv2_channels * (self.height / 4) * (self.width / 4)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ImageClassifier<B> {
        let kernel = [self.kernel_size, self.kernel_size];
        let conv1 = Conv2dConfig::new([1, self.conv1_channels], kernel)
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        let conv2 = Conv2dConfig::new([self.conv1_channels, self.conv2_channels], kernel)
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();
        let fc1  = LinearConfig::new(self.flat_dim(), self.hidden_size).init(device);
        let fc2  = LinearConfig::new(self.hidden_size, self.num_classes).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        ImageClassifier {
            conv1, conv2, pool, fc1, fc2, dropout,
            flat_dim: self.flat_dim(),
        }
    }
}

/// conv → relu → pool → conv → relu → pool → dense → relu → dropout → dense
#[derive(Module, Debug)]
pub struct ImageClassifier<B: Backend> {
    pub conv1:    Conv2d<B>,
    pub conv2:    Conv2d<B>,
    pub pool:     MaxPool2d,
    pub fc1:      Linear<B>,
    pub fc2:      Linear<B>,
    pub dropout:  Dropout,
    pub flat_dim: usize,
}

impl<B: Backend> ImageClassifier<B> {
    /// images: [batch, 1, height, width] → logits: [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let [batch_size, _, _, _] = images.dims();

        let x = self.pool.forward(relu(self.conv1.forward(images)));
        let x = self.pool.forward(relu(self.conv2.forward(x)));
        let x = x.reshape([batch_size, self.flat_dim]);

        let x = self.dropout.forward(relu(self.fc1.forward(x)));
        self.fc2.forward(x)
    }

    /// Cross-entropy loss over the logits, plus the logits for accuracy.
    pub fn forward_loss(
        &self,
        images: Tensor<B, 4>,
        labels: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(images);
        let ce = CrossEntropyLossConfig::new().init(&logits.device());
        let loss = ce.forward(logits.clone(), labels);
        (loss, logits)
    }
}
