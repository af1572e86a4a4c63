use std::fmt;

/// Array-backed binary min-heap used to merge tree nodes by weight.
#[derive(Debug, Clone)]
pub struct MinHeap<T> {
    elements: Vec<T>,
}

impl<T> MinHeap<T> {
    pub fn heap_size(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn parent(i: usize) -> usize {
        (i - 1) / 2
    }

    fn left(i: usize) -> usize {
        2 * i + 1
    }

    fn right(i: usize) -> usize {
        2 * i + 2
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeapErr {
    KeyError(usize, usize),
    HeapUnderflow,
}

impl fmt::Display for HeapErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapErr::KeyError(i, size) => write!(f, "index {i} out of bounds for heap of {size}"),
            HeapErr::HeapUnderflow => write!(f, "extract from empty heap"),
        }
    }
}

impl std::error::Error for HeapErr {}

impl<T: Ord> MinHeap<T> {
    pub fn build(source: Vec<T>) -> Result<Self, HeapErr> {
        let mut heap = MinHeap { elements: source };
        let n = heap.heap_size();
        for i in (0..n / 2).rev() {
            heap.min_heapify(i)?;
        }
        Ok(heap)
    }

    pub fn valid_min_heap(&self) -> bool {
        (1..self.heap_size()).all(|i| self.elements[Self::parent(i)] <= self.elements[i])
    }

    pub fn min_heapify(&mut self, mut i: usize) -> Result<(), HeapErr> {
        if i >= self.heap_size() {
            return Err(HeapErr::KeyError(i, self.heap_size()));
        }
        loop {
            let l = Self::left(i);
            let r = Self::right(i);
            let mut smallest = i;

            if l < self.heap_size() && self.elements[l] < self.elements[smallest] {
                smallest = l;
            }
            if r < self.heap_size() && self.elements[r] < self.elements[smallest] {
                smallest = r;
            }
            if smallest == i {
                return Ok(());
            }
            self.elements.swap(i, smallest);
            i = smallest;
        }
    }

    pub fn insert(&mut self, value: T) {
        self.elements.push(value);
        let mut i = self.heap_size() - 1;
        while i > 0 && self.elements[i] < self.elements[Self::parent(i)] {
            let p = Self::parent(i);
            self.elements.swap(i, p);
            i = p;
        }
        debug_assert!(self.valid_min_heap());
    }

    pub fn extract_min(&mut self) -> Result<T, HeapErr> {
        if self.is_empty() {
            return Err(HeapErr::HeapUnderflow);
        }
        let n = self.heap_size() - 1;
        self.elements.swap(0, n);
        let result = self.elements.pop().ok_or(HeapErr::HeapUnderflow)?;
        if !self.is_empty() {
            self.min_heapify(0)?;
        }
        Ok(result)
    }
}
