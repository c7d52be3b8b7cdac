fn main() {
    swipedeck::start();
}
