pub trait Approx_Eq_Testable {
    fn cmp_list(&self) -> Vec<f32>;
}

impl Approx_Eq_Testable for f32 {
    fn cmp_list(&self) -> Vec<f32> {
        vec![*self]
    }
}

impl<const N: usize> Approx_Eq_Testable for [f32; N] {
    fn cmp_list(&self) -> Vec<f32> {
        self.to_vec()
    }
}
